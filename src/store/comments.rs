// src/store/comments.rs

use sqlx::{FromRow, PgPool};

use crate::{
    error::AppError,
    models::{
        comment::{BlogComment, BlogCommentWithMetadata},
        user::{Author, UserRole},
    },
};

/// Which slice of a blog's comment tree to list.
#[derive(Debug, Clone, Copy)]
pub enum CommentLevel {
    /// Comments on the blog itself (`parent_comment_id IS NULL`).
    TopLevel { blog_id: i64 },
    /// Replies under one comment.
    Replies { parent_comment_id: i64 },
}

#[derive(FromRow)]
struct CommentRow {
    #[sqlx(flatten)]
    comment: BlogComment,
    author_email: String,
    author_role: UserRole,
    comment_likes_count: i64,
    comment_replies_count: i64,
}

impl From<CommentRow> for BlogCommentWithMetadata {
    fn from(row: CommentRow) -> Self {
        let blog_comment_author = Author {
            id: row.comment.comment_author_id,
            email: row.author_email,
            role: row.author_role,
        };
        BlogCommentWithMetadata {
            comment: row.comment,
            blog_comment_author,
            comment_likes_count: row.comment_likes_count,
            comment_replies_count: row.comment_replies_count,
        }
    }
}

pub async fn get_comment(pool: &PgPool, comment_id: i64) -> Result<Option<BlogComment>, AppError> {
    let comment = sqlx::query_as::<_, BlogComment>(
        r#"
        SELECT id, blog_comment, comment_author_id, blog_id, parent_comment_id,
               comment_created_at, comment_updated_at
        FROM blog_comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

pub async fn insert_comment(
    pool: &PgPool,
    author_id: i64,
    blog_id: i64,
    parent_comment_id: Option<i64>,
    content: &str,
) -> Result<BlogComment, AppError> {
    let comment = sqlx::query_as::<_, BlogComment>(
        r#"
        INSERT INTO blog_comments (blog_comment, comment_author_id, blog_id, parent_comment_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, blog_comment, comment_author_id, blog_id, parent_comment_id,
                  comment_created_at, comment_updated_at
        "#,
    )
    .bind(content)
    .bind(author_id)
    .bind(blog_id)
    .bind(parent_comment_id)
    .fetch_one(pool)
    .await?;

    Ok(comment)
}

pub async fn update_comment_content(
    pool: &PgPool,
    comment_id: i64,
    content: &str,
) -> Result<BlogComment, AppError> {
    sqlx::query_as::<_, BlogComment>(
        r#"
        UPDATE blog_comments SET blog_comment = $2, comment_updated_at = NOW()
        WHERE id = $1
        RETURNING id, blog_comment, comment_author_id, blog_id, parent_comment_id,
                  comment_created_at, comment_updated_at
        "#,
    )
    .bind(comment_id)
    .bind(content)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("blog comment does not exist".to_string()))
}

/// Replies and likes go with it through `ON DELETE CASCADE`.
pub async fn delete_comment(pool: &PgPool, comment_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM blog_comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Newest first, each annotated with its author, like count and reply count.
pub async fn list_comments(
    pool: &PgPool,
    level: CommentLevel,
    skip: i64,
    limit: i64,
) -> Result<Vec<BlogCommentWithMetadata>, AppError> {
    let (filter, key) = level_filter(level);
    let sql = format!(
        r#"
        SELECT c.id, c.blog_comment, c.comment_author_id, c.blog_id, c.parent_comment_id,
               c.comment_created_at, c.comment_updated_at,
               u.email AS author_email,
               u.role AS author_role,
               (SELECT COUNT(DISTINCT l.liked_by_id)
                  FROM blog_comment_likes l
                 WHERE l.liked_blog_comment_id = c.id) AS comment_likes_count,
               (SELECT COUNT(*)
                  FROM blog_comments r
                 WHERE r.parent_comment_id = c.id) AS comment_replies_count
        FROM blog_comments c
        JOIN users u ON u.id = c.comment_author_id
        WHERE {filter}
        ORDER BY c.comment_created_at DESC, c.id DESC
        LIMIT $2 OFFSET $3
        "#
    );

    let rows = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(key)
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(BlogCommentWithMetadata::from).collect())
}

pub async fn count_comments(pool: &PgPool, level: CommentLevel) -> Result<i64, AppError> {
    let (filter, key) = level_filter(level);
    let sql = format!("SELECT COUNT(*) FROM blog_comments c WHERE {filter}");

    let total: i64 = sqlx::query_scalar(&sql).bind(key).fetch_one(pool).await?;
    Ok(total)
}

fn level_filter(level: CommentLevel) -> (&'static str, i64) {
    match level {
        CommentLevel::TopLevel { blog_id } => {
            ("c.blog_id = $1 AND c.parent_comment_id IS NULL", blog_id)
        }
        CommentLevel::Replies { parent_comment_id } => {
            ("c.parent_comment_id = $1", parent_comment_id)
        }
    }
}
