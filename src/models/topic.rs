// src/models/topic.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::validation::validate_not_blank;

/// Represents the 'topics' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub id: i64,
    /// Unique case-insensitively; stored trimmed and lower-cased.
    pub topic_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating or renaming a topic (admin only).
#[derive(Debug, Deserialize, Validate)]
pub struct TopicNameRequest {
    #[validate(
        length(max = 50, message = "Topic name must be at most 50 characters"),
        custom(function = validate_not_blank, message = "topic name is required")
    )]
    pub topic_name: String,
}

impl TopicNameRequest {
    pub fn normalized_name(&self) -> String {
        normalize_topic_name(&self.topic_name)
    }
}

pub fn normalize_topic_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// `GET /topic?search=&page=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct TopicListParams {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
