use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{models::user::Author, utils::validation::validate_not_blank};

/// Represents the 'blog_comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BlogComment {
    pub id: i64,
    pub blog_comment: String,
    pub comment_author_id: i64,
    pub blog_id: i64,
    /// `None` for top-level comments; otherwise always a top-level comment id.
    pub parent_comment_id: Option<i64>,
    pub comment_created_at: chrono::DateTime<chrono::Utc>,
    pub comment_updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Comment with its author, returned from create/update.
#[derive(Debug, Serialize)]
pub struct BlogCommentWithAuthor {
    #[serde(flatten)]
    pub comment: BlogComment,
    pub blog_comment_author: Author,
}

/// Listing entry: comment, author, like and reply counters.
#[derive(Debug, Serialize)]
pub struct BlogCommentWithMetadata {
    #[serde(flatten)]
    pub comment: BlogComment,
    pub blog_comment_author: Author,
    pub comment_likes_count: i64,
    pub comment_replies_count: i64,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlogCommentRequest {
    pub blog_id: i64,

    #[validate(
        length(max = 1000, message = "Comment must be at most 1000 characters"),
        custom(function = validate_not_blank, message = "blog comment content cannot be empty")
    )]
    pub blog_comment: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_comment_id: Option<i64>,
}

/// DTO for editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBlogCommentRequest {
    #[validate(
        length(max = 1000, message = "Comment must be at most 1000 characters"),
        custom(function = validate_not_blank, message = "blog comment content is required")
    )]
    pub blog_comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_comment_rejected() {
        let req = CreateBlogCommentRequest {
            blog_id: 1,
            blog_comment: " \n\t ".into(),
            parent_comment_id: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn reply_payload_parses() {
        let req: CreateBlogCommentRequest = serde_json::from_value(serde_json::json!({
            "blog_id": 4,
            "blog_comment": "agreed",
            "parent_comment_id": 9
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.parent_comment_id, Some(9));
    }
}
