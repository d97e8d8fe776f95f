// src/handlers/blog.rs

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
    feed::{self, FeedScope},
    models::blog::{BlogStatus, CreateBlogRequest, UpdateBlogStatusRequest},
    publication,
    store::{
        associations::{self, BLOG_BOOKMARKS, BLOG_LIKES},
        blogs::{self, NewBlog},
    },
    utils::{
        html::clean_html,
        pagination::{PageParams, Pagination},
    },
};

/// Creates a blog as a draft or directly published.
/// A published blog must come with at least one topic.
pub async fn create_blog(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    match payload.blog_status {
        BlogStatus::Draft => {}
        BlogStatus::Published if payload.blog_topic_ids.is_empty() => {
            return Err(AppError::BadRequest(
                "blog topics compulsory for published blog".to_string(),
            ));
        }
        BlogStatus::Published => {}
        BlogStatus::Archived => {
            return Err(AppError::BadRequest("invalid blog status".to_string()));
        }
    }

    let description = payload
        .blog_description
        .as_deref()
        .map(|d| clean_html(d.trim()))
        .filter(|d| !d.is_empty());

    let blog = blogs::create_blog_with_topics(
        &pool,
        NewBlog {
            blog_title: payload.blog_title.trim(),
            blog_description: description.as_deref(),
            blog_content: &payload.blog_content,
            blog_thumbnail: payload.blog_thumbnail_url.as_deref(),
            blog_status: payload.blog_status,
            blog_author_id: user_id,
        },
        &payload.blog_topic_ids,
    )
    .await?;

    tracing::info!(blog_id = blog.id, author_id = user_id, status = %blog.blog_status, "Blog created");

    let blog = blogs::with_author_and_topics(&pool, blog).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "blog created successfully",
            "blog": blog,
        })),
    ))
}

/// Single blog. Drafts and archived blogs are only visible to their author.
pub async fn get_blog(
    State(pool): State<PgPool>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(blog_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let blog = publication::visible_blog(&pool, blog_id, viewer).await?;
    let blog = blogs::with_author_and_topics(&pool, blog).await?;

    Ok(Json(json!({
        "success": true,
        "blog": blog,
    })))
}

pub async fn delete_blog(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(blog_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    publication::delete_blog(&pool, user_id, blog_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "blog deleted successfully",
    })))
}

pub async fn update_blog_status(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(blog_id): Path<i64>,
    Json(payload): Json<UpdateBlogStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let blog = publication::change_status(
        &pool,
        user_id,
        blog_id,
        payload.blog_status,
        &payload.blog_topic_ids,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "blog status updated successfully",
        "blog": blog,
    })))
}

pub async fn toggle_like(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(blog_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    publication::visible_blog(&pool, blog_id, Some(user_id)).await?;

    let outcome = associations::toggle(&pool, BLOG_LIKES, user_id, blog_id).await?;
    let likes = associations::count_for_target(&pool, BLOG_LIKES, blog_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("blog like {}", past_tense(outcome)),
        "action": outcome,
        "blog_likes_count": likes,
    })))
}

pub async fn toggle_bookmark(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(blog_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    publication::visible_blog(&pool, blog_id, Some(user_id)).await?;

    let outcome = associations::toggle(&pool, BLOG_BOOKMARKS, user_id, blog_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("blog bookmark {}", past_tense(outcome)),
        "action": outcome,
    })))
}

/// Ranked feed: followed topics for a signed-in reader who follows any,
/// otherwise the most followed topics.
pub async fn get_feed(
    State(pool): State<PgPool>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::try_from(params)?;
    let scope = feed::personal_scope(&pool, viewer).await?;
    feed_response(&pool, scope, pagination).await
}

pub async fn list_blog_comments(
    State(pool): State<PgPool>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(blog_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::try_from(params)?;
    let (blog_comments, total) =
        comments::list_blog_comments(&pool, blog_id, viewer, pagination).await?;

    Ok(Json(json!({
        "success": true,
        "blog_comments": blog_comments,
        "no_of_pages": pagination.no_of_pages(total),
    })))
}

pub(crate) async fn feed_response(
    pool: &PgPool,
    scope: FeedScope,
    pagination: Pagination,
) -> Result<Json<serde_json::Value>, AppError> {
    let (blogs, total) = feed::rank_blogs(pool, scope, pagination).await?;

    Ok(Json(json!({
        "success": true,
        "blogs": blogs,
        "no_of_pages": pagination.no_of_pages(total),
    })))
}

fn past_tense(outcome: associations::ToggleOutcome) -> &'static str {
    match outcome {
        associations::ToggleOutcome::Added => "added",
        associations::ToggleOutcome::Removed => "removed",
    }
}
