// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post, put},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, blog, comment, topic},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, blog, blog-comment, topic) under `/api`.
/// * Applies global middleware (Trace, CORS, request timeout).
/// * Injects global state (pool, config, session keys, mailer).
pub fn create_router(state: AppState) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);
    match state.config.client_url.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!(client_url = %state.config.client_url, "CLIENT_URL is not a valid origin, CORS disabled"),
    }

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/activate/{token}", put(auth::activate))
        .route("/login", post(auth::login))
        .route("/user", get(auth::current_user));

    let blog_routes = Router::new()
        .route("/", post(blog::create_blog))
        .route("/feed", get(blog::get_feed))
        .route("/{id}", get(blog::get_blog).delete(blog::delete_blog))
        .route("/{id}/status", patch(blog::update_blog_status))
        .route("/{id}/like", post(blog::toggle_like))
        .route("/{id}/bookmark", post(blog::toggle_bookmark))
        .route("/{id}/blog-comments", get(blog::list_blog_comments));

    let comment_routes = Router::new()
        .route("/", post(comment::create_comment))
        .route(
            "/{id}",
            put(comment::update_comment).delete(comment::delete_comment),
        )
        .route("/{id}/like", post(comment::toggle_like))
        .route("/{id}/comments", get(comment::list_replies));

    let topic_routes = Router::new()
        .route("/", get(topic::list_topics).post(topic::create_topic))
        .route(
            "/{id}",
            put(topic::update_topic).delete(topic::delete_topic),
        )
        .route("/{id}/follow", post(topic::toggle_follow))
        .route("/{id}/blogs", get(topic::list_topic_blogs));

    let request_timeout = state.config.request_timeout;

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/blog", blog_routes)
        .nest("/api/blog-comment", comment_routes)
        .nest("/api/topic", topic_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "health OK",
    }))
}
