// src/models/blog.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use crate::{
    config::MAX_TOPICS_PER_BLOG,
    models::{topic::Topic, user::Author},
    utils::validation::validate_not_blank,
};

/// Publication state, stored in the `blog_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "blog_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    Draft,
    Published,
    Archived,
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlogStatus::Draft => "draft",
            BlogStatus::Published => "published",
            BlogStatus::Archived => "archived",
        };
        write!(f, "{}", s)
    }
}

/// Represents the 'blogs' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub blog_title: String,
    pub blog_description: Option<String>,

    /// Structured document produced by the editor. Opaque to the backend.
    pub blog_content: serde_json::Value,

    pub blog_thumbnail: Option<String>,
    pub blog_status: BlogStatus,
    pub blog_author_id: i64,

    /// First publication instant. Survives archive/republish cycles.
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,

    pub blog_created_at: chrono::DateTime<chrono::Utc>,
    pub blog_updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Blog with its author and full topic set.
#[derive(Debug, Clone, Serialize)]
pub struct BlogWithAuthorAndTopics {
    #[serde(flatten)]
    pub blog: Blog,
    pub blog_author: Author,
    pub blog_topics: Vec<Topic>,
}

/// Feed entry: blog, author, topics and engagement counters.
#[derive(Debug, Clone, Serialize)]
pub struct BlogWithMetadata {
    #[serde(flatten)]
    pub blog: Blog,
    pub blog_author: Author,
    pub blog_topics: Vec<Topic>,
    pub blog_likes_count: i64,
    pub blog_comments_count: i64,
    pub blog_bookmarks_count: i64,
    pub activity_score: f64,
}

/// DTO for creating a new blog.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlogRequest {
    #[validate(
        length(max = 200, message = "Title must be at most 200 characters"),
        custom(function = validate_not_blank, message = "blog title and content are required")
    )]
    pub blog_title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub blog_description: Option<String>,

    #[validate(custom(function = validate_content))]
    pub blog_content: serde_json::Value,

    #[validate(custom(function = validate_thumbnail_url))]
    pub blog_thumbnail_url: Option<String>,

    pub blog_status: BlogStatus,

    #[serde(default)]
    #[validate(custom(function = validate_topic_ids))]
    pub blog_topic_ids: Vec<i64>,
}

/// DTO for `PATCH /blog/{id}/status`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBlogStatusRequest {
    pub blog_status: BlogStatus,

    /// Extra topics attached while publishing a draft.
    #[serde(default)]
    #[validate(custom(function = validate_topic_ids))]
    pub blog_topic_ids: Vec<i64>,
}

fn validate_content(content: &serde_json::Value) -> Result<(), validator::ValidationError> {
    let empty = match content {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
        _ => false,
    };
    if empty {
        return Err(validator::ValidationError::new("content_required")
            .with_message("blog title and content are required".into()));
    }
    Ok(())
}

/// Validates that the thumbnail is an absolute URL of reasonable length.
fn validate_thumbnail_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.len() > 500 {
        return Err(validator::ValidationError::new("url_too_long"));
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

fn validate_topic_ids(ids: &[i64]) -> Result<(), validator::ValidationError> {
    if ids.len() > MAX_TOPICS_PER_BLOG {
        return Err(validator::ValidationError::new("too_many_topics").with_message(
            format!("a blog can have max {} no of topics", MAX_TOPICS_PER_BLOG).into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    if !ids.iter().all(|id| seen.insert(*id)) {
        return Err(validator::ValidationError::new("duplicate_topics")
            .with_message("duplicate topic ids".into()));
    }
    Ok(())
}
