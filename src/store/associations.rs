// src/store/associations.rs
//
// Composite-keyed (actor, target) rows whose existence is the whole state:
// blog likes, blog bookmarks, comment likes and topic follows.

use serde::Serialize;
use sqlx::PgPool;

use crate::{
    error::AppError,
    store::{is_foreign_key_violation, is_unique_violation},
};

/// Table and key columns of one association kind.
#[derive(Debug, Clone, Copy)]
pub struct Association {
    pub table: &'static str,
    pub actor_column: &'static str,
    pub target_column: &'static str,
    /// Used in "does not exist" messages.
    pub target_name: &'static str,
}

pub const BLOG_LIKES: Association = Association {
    table: "blog_likes",
    actor_column: "liked_by_id",
    target_column: "liked_blog_id",
    target_name: "blog",
};

pub const BLOG_BOOKMARKS: Association = Association {
    table: "blog_bookmarks",
    actor_column: "bookmarked_by_id",
    target_column: "bookmarked_blog_id",
    target_name: "blog",
};

pub const BLOG_COMMENT_LIKES: Association = Association {
    table: "blog_comment_likes",
    actor_column: "liked_by_id",
    target_column: "liked_blog_comment_id",
    target_name: "blog comment",
};

pub const TOPIC_FOLLOWS: Association = Association {
    table: "topic_follows",
    actor_column: "user_id",
    target_column: "topic_id",
    target_name: "topic",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

pub async fn exists(
    pool: &PgPool,
    assoc: Association,
    actor_id: i64,
    target_id: i64,
) -> Result<bool, AppError> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1 AND {} = $2)",
        assoc.table, assoc.actor_column, assoc.target_column
    );
    let found: bool = sqlx::query_scalar(&sql)
        .bind(actor_id)
        .bind(target_id)
        .fetch_one(pool)
        .await?;

    Ok(found)
}

/// Creates the row. An already present row counts as success.
pub async fn add(
    pool: &PgPool,
    assoc: Association,
    actor_id: i64,
    target_id: i64,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES ($1, $2)",
        assoc.table, assoc.actor_column, assoc.target_column
    );
    match sqlx::query(&sql)
        .bind(actor_id)
        .bind(target_id)
        .execute(pool)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Ok(()),
        Err(e) if is_foreign_key_violation(&e) => Err(AppError::NotFound(format!(
            "{} does not exist",
            assoc.target_name
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Deletes the row, reporting not-found when there was nothing to delete.
pub async fn remove(
    pool: &PgPool,
    assoc: Association,
    actor_id: i64,
    target_id: i64,
) -> Result<(), AppError> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        assoc.table, assoc.actor_column, assoc.target_column
    );
    let result = sqlx::query(&sql)
        .bind(actor_id)
        .bind(target_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "{} association does not exist",
            assoc.target_name
        )));
    }
    Ok(())
}

/// Check-then-act toggle. A concurrent double toggle by the same actor can
/// lose the race either way; both losing outcomes (duplicate insert, empty
/// delete) already describe the state the caller asked for.
pub async fn toggle(
    pool: &PgPool,
    assoc: Association,
    actor_id: i64,
    target_id: i64,
) -> Result<ToggleOutcome, AppError> {
    if exists(pool, assoc, actor_id, target_id).await? {
        match remove(pool, assoc, actor_id, target_id).await {
            Ok(()) | Err(AppError::NotFound(_)) => Ok(ToggleOutcome::Removed),
            Err(e) => Err(e),
        }
    } else {
        add(pool, assoc, actor_id, target_id).await?;
        Ok(ToggleOutcome::Added)
    }
}

/// Number of distinct actors associated with a target.
pub async fn count_for_target(
    pool: &PgPool,
    assoc: Association,
    target_id: i64,
) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(DISTINCT {}) FROM {} WHERE {} = $1",
        assoc.actor_column, assoc.table, assoc.target_column
    );
    let total: i64 = sqlx::query_scalar(&sql)
        .bind(target_id)
        .fetch_one(pool)
        .await?;

    Ok(total)
}
