// src/handlers/topic.rs

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
    error::AppError,
    extractors::{AdminUser, AuthUser},
    feed::FeedScope,
    handlers::blog::feed_response,
    models::topic::{TopicListParams, TopicNameRequest},
    store::{
        associations::{self, TOPIC_FOLLOWS},
        topics,
    },
    utils::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE, PageParams, Pagination},
};

/// `GET /topic?search=&page=&limit=`, ordered by id.
pub async fn list_topics(
    State(pool): State<PgPool>,
    Query(params): Query<TopicListParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::new(
        params.page.unwrap_or(DEFAULT_PAGE),
        params.limit.unwrap_or(DEFAULT_LIMIT),
    )?;
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let page = topics::list_topics(&pool, search, pagination.skip(), pagination.limit).await?;
    let total = topics::count_topics(&pool, search).await?;

    Ok(Json(json!({
        "success": true,
        "topics": page,
        "no_of_pages": pagination.no_of_pages(total),
    })))
}

pub async fn create_topic(
    State(pool): State<PgPool>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<TopicNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let topic = topics::create_topic(&pool, &payload.normalized_name()).await?;
    tracing::info!(topic_id = topic.id, admin_id = admin.id, "Topic created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "topic created successfully",
            "topic": topic,
        })),
    ))
}

pub async fn update_topic(
    State(pool): State<PgPool>,
    AdminUser(admin): AdminUser,
    Path(topic_id): Path<i64>,
    Json(payload): Json<TopicNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let topic = topics::rename_topic(&pool, topic_id, &payload.normalized_name()).await?;
    tracing::info!(topic_id, admin_id = admin.id, "Topic renamed");

    Ok(Json(json!({
        "success": true,
        "message": "topic updated successfully",
        "topic": topic,
    })))
}

pub async fn delete_topic(
    State(pool): State<PgPool>,
    AdminUser(admin): AdminUser,
    Path(topic_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    topics::delete_topic(&pool, topic_id).await?;
    tracing::info!(topic_id, admin_id = admin.id, "Topic deleted");

    Ok(Json(json!({
        "success": true,
        "message": "topic deleted successfully",
    })))
}

pub async fn toggle_follow(
    State(pool): State<PgPool>,
    AuthUser { user_id }: AuthUser,
    Path(topic_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = associations::toggle(&pool, TOPIC_FOLLOWS, user_id, topic_id).await?;

    Ok(Json(json!({
        "success": true,
        "action": outcome,
    })))
}

/// Ranked published blogs tagged with one topic. Open to anonymous readers.
pub async fn list_topic_blogs(
    State(pool): State<PgPool>,
    Path(topic_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::try_from(params)?;

    if topics::get_topic(&pool, topic_id).await?.is_none() {
        return Err(AppError::NotFound("topic does not exist".to_string()));
    }

    feed_response(&pool, FeedScope::Topic(topic_id), pagination).await
}
