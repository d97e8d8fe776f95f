// src/store/topics.rs

use std::collections::HashSet;

use sqlx::{PgExecutor, PgPool};

use crate::{error::AppError, models::topic::Topic, store::is_unique_violation};

pub async fn get_topic(pool: &PgPool, topic_id: i64) -> Result<Option<Topic>, AppError> {
    let topic = sqlx::query_as::<_, Topic>(
        "SELECT id, topic_name, created_at, updated_at FROM topics WHERE id = $1",
    )
    .bind(topic_id)
    .fetch_optional(pool)
    .await?;

    Ok(topic)
}

pub async fn create_topic(pool: &PgPool, topic_name: &str) -> Result<Topic, AppError> {
    sqlx::query_as::<_, Topic>(
        r#"
        INSERT INTO topics (topic_name)
        VALUES ($1)
        RETURNING id, topic_name, created_at, updated_at
        "#,
    )
    .bind(topic_name)
    .fetch_one(pool)
    .await
    .map_err(map_duplicate_name)
}

pub async fn rename_topic(
    pool: &PgPool,
    topic_id: i64,
    topic_name: &str,
) -> Result<Topic, AppError> {
    sqlx::query_as::<_, Topic>(
        r#"
        UPDATE topics SET topic_name = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, topic_name, created_at, updated_at
        "#,
    )
    .bind(topic_id)
    .bind(topic_name)
    .fetch_optional(pool)
    .await
    .map_err(map_duplicate_name)?
    .ok_or_else(|| AppError::NotFound("topic does not exist".to_string()))
}

/// Deletes a topic unless that would strip the last topic from a blog that
/// is published or archived.
pub async fn delete_topic(pool: &PgPool, topic_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM topics WHERE id = $1 FOR UPDATE")
        .bind(topic_id)
        .fetch_optional(&mut *tx)
        .await?;
    if locked.is_none() {
        return Err(AppError::NotFound("topic does not exist".to_string()));
    }

    // Concurrent deletes of a blog's other topics serialize on the blog rows,
    // so the orphan check below sees their committed result.
    sqlx::query(
        r#"
        SELECT b.id
        FROM blogs b
        JOIN blog_topics bt ON bt.blog_id = b.id
        WHERE bt.topic_id = $1 AND b.blog_status <> 'draft'
        ORDER BY b.id
        FOR UPDATE OF b
        "#,
    )
    .bind(topic_id)
    .fetch_all(&mut *tx)
    .await?;

    let orphans_published: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM blog_topics bt
            JOIN blogs b ON b.id = bt.blog_id
            WHERE bt.topic_id = $1
              AND b.blog_status <> 'draft'
              AND NOT EXISTS (
                  SELECT 1 FROM blog_topics other
                  WHERE other.blog_id = bt.blog_id AND other.topic_id <> $1
              )
        )
        "#,
    )
    .bind(topic_id)
    .fetch_one(&mut *tx)
    .await?;

    if orphans_published {
        return Err(AppError::BadRequest(
            "topic is the only topic of a published blog".to_string(),
        ));
    }

    sqlx::query("DELETE FROM topics WHERE id = $1")
        .bind(topic_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Topics ordered by id, optionally filtered by a case-insensitive substring.
pub async fn list_topics(
    pool: &PgPool,
    search: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Topic>, AppError> {
    let topics = sqlx::query_as::<_, Topic>(
        r#"
        SELECT id, topic_name, created_at, updated_at
        FROM topics
        WHERE ($1::TEXT IS NULL OR topic_name ILIKE '%' || $1 || '%')
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(search)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    Ok(topics)
}

pub async fn count_topics(pool: &PgPool, search: Option<&str>) -> Result<i64, AppError> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM topics
        WHERE ($1::TEXT IS NULL OR topic_name ILIKE '%' || $1 || '%')
        "#,
    )
    .bind(search)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Returns the ids from `topic_ids` that have no matching topic row.
pub async fn missing_topic_ids<'e, E>(executor: E, topic_ids: &[i64]) -> Result<Vec<i64>, AppError>
where
    E: PgExecutor<'e>,
{
    if topic_ids.is_empty() {
        return Ok(Vec::new());
    }

    let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM topics WHERE id = ANY($1)")
        .bind(topic_ids)
        .fetch_all(executor)
        .await?;
    let found: HashSet<i64> = found.into_iter().collect();

    Ok(topic_ids
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect())
}

/// Fails with not-found if any of `topic_ids` does not exist.
pub async fn ensure_topics_exist<'e, E>(executor: E, topic_ids: &[i64]) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    match missing_topic_ids(executor, topic_ids).await?.first() {
        Some(id) => Err(AppError::NotFound(format!("topic {} does not exist", id))),
        None => Ok(()),
    }
}

/// Ids of the topics `user_id` follows.
pub async fn followed_topic_ids(pool: &PgPool, user_id: i64) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar("SELECT topic_id FROM topic_follows WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(ids)
}

/// The `n` most followed topics. Topics nobody follows are never picked;
/// ties fall back to topic id.
pub async fn most_followed_topic_ids(pool: &PgPool, n: i64) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar(
        r#"
        SELECT topic_id
        FROM topic_follows
        GROUP BY topic_id
        ORDER BY COUNT(*) DESC, topic_id
        LIMIT $1
        "#,
    )
    .bind(n)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

fn map_duplicate_name(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::BadRequest("topic already exists".to_string())
    } else {
        AppError::from(err)
    }
}
