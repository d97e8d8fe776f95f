// src/handlers/comment.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    comments,
    error::AppError,
    extractors::{AuthUser, MaybeAuthUser},
    models::comment::{CreateBlogCommentRequest, UpdateBlogCommentRequest},
    store::associations::{self, BLOG_COMMENT_LIKES},
    utils::pagination::{PageParams, Pagination},
};

/// Comments on a blog, or replies when `parent_comment_id` is set.
pub async fn create_comment(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Json(payload): Json<CreateBlogCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment = comments::create_comment(
        &pool,
        user_id,
        payload.blog_id,
        payload.parent_comment_id,
        &payload.blog_comment,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "blog comment created successfully",
            "blog_comment": comment,
        })),
    ))
}

pub async fn update_comment(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(comment_id): Path<i64>,
    Json(payload): Json<UpdateBlogCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment =
        comments::update_comment(&pool, user_id, comment_id, &payload.blog_comment).await?;

    Ok(Json(json!({
        "success": true,
        "message": "blog comment updated successfully",
        "blog_comment": comment,
    })))
}

pub async fn delete_comment(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    comments::delete_comment(&pool, user_id, comment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "blog comment deleted successfully",
    })))
}

pub async fn toggle_like(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    comments::visible_comment(&pool, comment_id, Some(user_id)).await?;

    let outcome = associations::toggle(&pool, BLOG_COMMENT_LIKES, user_id, comment_id).await?;
    let likes = associations::count_for_target(&pool, BLOG_COMMENT_LIKES, comment_id).await?;

    Ok(Json(json!({
        "success": true,
        "action": outcome,
        "comment_likes_count": likes,
    })))
}

/// Replies under one comment, newest first.
pub async fn list_replies(
    State(pool): State<PgPool>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(comment_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::try_from(params)?;
    let (blog_comments, total) = comments::list_replies(&pool, comment_id, viewer, pagination).await?;

    Ok(Json(json!({
        "success": true,
        "blog_comments": blog_comments,
        "no_of_pages": pagination.no_of_pages(total),
    })))
}
