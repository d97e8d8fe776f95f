// src/comments.rs
//
// Two-level comment tree. Top-level comments hang off a blog; every reply
// hangs off a top-level comment, so a reply to a reply is stored under the
// reply's own parent.

use sqlx::PgPool;

use crate::{
    error::AppError,
    models::comment::{BlogComment, BlogCommentWithAuthor, BlogCommentWithMetadata},
    publication::visible_blog,
    store::{
        blogs,
        comments::{self, CommentLevel},
    },
    utils::{html::clean_html, pagination::Pagination},
};

/// Picks the stored parent for a new comment on `blog_id` that answers
/// `replying_to`. Returns `None` for a top-level comment.
pub fn resolve_parent(
    blog_id: i64,
    replying_to: Option<&BlogComment>,
) -> Result<Option<i64>, AppError> {
    let Some(parent) = replying_to else {
        return Ok(None);
    };
    if parent.blog_id != blog_id {
        return Err(AppError::BadRequest(
            "parent comment is not blog's comment".to_string(),
        ));
    }
    Ok(Some(parent.parent_comment_id.unwrap_or(parent.id)))
}

/// Trimmed and sanitized comment body; empty bodies are rejected.
pub fn prepare_content(raw: &str) -> Result<String, AppError> {
    let cleaned = clean_html(raw.trim());
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(AppError::BadRequest(
            "blog comment content cannot be empty".to_string(),
        ));
    }
    Ok(cleaned.to_string())
}

async fn existing_comment(pool: &PgPool, comment_id: i64) -> Result<BlogComment, AppError> {
    comments::get_comment(pool, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog comment does not exist".to_string()))
}

async fn owned_comment(
    pool: &PgPool,
    actor_id: i64,
    comment_id: i64,
) -> Result<BlogComment, AppError> {
    let comment = existing_comment(pool, comment_id).await?;
    if comment.comment_author_id != actor_id {
        return Err(AppError::AuthError("unauthorized".to_string()));
    }
    Ok(comment)
}

pub async fn create_comment(
    pool: &PgPool,
    actor_id: i64,
    blog_id: i64,
    parent_comment_id: Option<i64>,
    raw_content: &str,
) -> Result<BlogCommentWithAuthor, AppError> {
    let content = prepare_content(raw_content)?;
    visible_blog(pool, blog_id, Some(actor_id)).await?;

    let parent = match parent_comment_id {
        Some(id) => Some(existing_comment(pool, id).await?),
        None => None,
    };
    let stored_parent = resolve_parent(blog_id, parent.as_ref())?;

    let comment = comments::insert_comment(pool, actor_id, blog_id, stored_parent, &content).await?;
    tracing::info!(comment_id = comment.id, blog_id, "Comment created");

    with_author(pool, comment).await
}

pub async fn update_comment(
    pool: &PgPool,
    actor_id: i64,
    comment_id: i64,
    raw_content: &str,
) -> Result<BlogCommentWithAuthor, AppError> {
    let content = prepare_content(raw_content)?;
    owned_comment(pool, actor_id, comment_id).await?;

    let comment = comments::update_comment_content(pool, comment_id, &content).await?;
    with_author(pool, comment).await
}

pub async fn delete_comment(pool: &PgPool, actor_id: i64, comment_id: i64) -> Result<(), AppError> {
    owned_comment(pool, actor_id, comment_id).await?;
    comments::delete_comment(pool, comment_id).await?;

    tracing::info!(comment_id, "Comment deleted");
    Ok(())
}

/// The comment, provided its blog is visible to `viewer_id`. Comments under
/// another author's draft or archived blog read as missing.
pub async fn visible_comment(
    pool: &PgPool,
    comment_id: i64,
    viewer_id: Option<i64>,
) -> Result<BlogComment, AppError> {
    let comment = existing_comment(pool, comment_id).await?;
    visible_blog(pool, comment.blog_id, viewer_id).await?;
    Ok(comment)
}

pub async fn list_blog_comments(
    pool: &PgPool,
    blog_id: i64,
    viewer_id: Option<i64>,
    pagination: Pagination,
) -> Result<(Vec<BlogCommentWithMetadata>, i64), AppError> {
    visible_blog(pool, blog_id, viewer_id).await?;
    list(pool, CommentLevel::TopLevel { blog_id }, pagination).await
}

pub async fn list_replies(
    pool: &PgPool,
    comment_id: i64,
    viewer_id: Option<i64>,
    pagination: Pagination,
) -> Result<(Vec<BlogCommentWithMetadata>, i64), AppError> {
    visible_comment(pool, comment_id, viewer_id).await?;
    list(
        pool,
        CommentLevel::Replies {
            parent_comment_id: comment_id,
        },
        pagination,
    )
    .await
}

async fn list(
    pool: &PgPool,
    level: CommentLevel,
    pagination: Pagination,
) -> Result<(Vec<BlogCommentWithMetadata>, i64), AppError> {
    let page = comments::list_comments(pool, level, pagination.skip(), pagination.limit).await?;
    let total = comments::count_comments(pool, level).await?;
    Ok((page, total))
}

async fn with_author(pool: &PgPool, comment: BlogComment) -> Result<BlogCommentWithAuthor, AppError> {
    let blog_comment_author = blogs::authors_by_id(pool, &[comment.comment_author_id])
        .await?
        .remove(&comment.comment_author_id)
        .ok_or_else(|| {
            AppError::InternalServerError(format!("comment {} has no author", comment.id))
        })?;

    Ok(BlogCommentWithAuthor {
        comment,
        blog_comment_author,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, blog_id: i64, parent_comment_id: Option<i64>) -> BlogComment {
        BlogComment {
            id,
            blog_comment: "text".into(),
            comment_author_id: 1,
            blog_id,
            parent_comment_id,
            comment_created_at: chrono::Utc::now(),
            comment_updated_at: None,
        }
    }

    #[test]
    fn no_parent_means_top_level() {
        assert_eq!(resolve_parent(3, None).unwrap(), None);
    }

    #[test]
    fn reply_to_top_level_uses_it_as_parent() {
        let top = comment(10, 3, None);
        assert_eq!(resolve_parent(3, Some(&top)).unwrap(), Some(10));
    }

    #[test]
    fn reply_to_reply_attaches_to_top_level() {
        let reply = comment(11, 3, Some(10));
        assert_eq!(resolve_parent(3, Some(&reply)).unwrap(), Some(10));
    }

    #[test]
    fn parent_from_other_blog_is_rejected() {
        let foreign = comment(20, 4, None);
        let err = resolve_parent(3, Some(&foreign)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "parent comment is not blog's comment"));
    }

    #[test]
    fn content_is_trimmed_and_sanitized() {
        assert_eq!(prepare_content("  great read \n").unwrap(), "great read");
        assert_eq!(
            prepare_content("hi<script>alert(1)</script>").unwrap(),
            "hi"
        );
    }

    #[test]
    fn blank_or_script_only_content_is_rejected() {
        assert!(prepare_content("   ").is_err());
        assert!(prepare_content("<script>alert(1)</script>").is_err());
    }
}
