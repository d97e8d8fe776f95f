// src/store/blogs.rs

use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};

use crate::{
    error::AppError,
    models::{
        blog::{Blog, BlogStatus, BlogWithAuthorAndTopics},
        topic::Topic,
        user::Author,
    },
    store::topics::ensure_topics_exist,
};

/// Fields of a blog about to be inserted.
#[derive(Debug)]
pub struct NewBlog<'a> {
    pub blog_title: &'a str,
    pub blog_description: Option<&'a str>,
    pub blog_content: &'a serde_json::Value,
    pub blog_thumbnail: Option<&'a str>,
    pub blog_status: BlogStatus,
    pub blog_author_id: i64,
}

#[derive(FromRow)]
struct BlogTopicRow {
    blog_id: i64,
    #[sqlx(flatten)]
    topic: Topic,
}

pub async fn get_blog<'e, E>(executor: E, blog_id: i64) -> Result<Option<Blog>, AppError>
where
    E: PgExecutor<'e>,
{
    let blog = sqlx::query_as::<_, Blog>(
        r#"
        SELECT id, blog_title, blog_description, blog_content, blog_thumbnail, blog_status,
               blog_author_id, published_at, blog_created_at, blog_updated_at
        FROM blogs
        WHERE id = $1
        "#,
    )
    .bind(blog_id)
    .fetch_optional(executor)
    .await?;

    Ok(blog)
}

/// Same as [`get_blog`] but takes a row lock for the rest of the transaction.
pub async fn lock_blog(conn: &mut PgConnection, blog_id: i64) -> Result<Option<Blog>, AppError> {
    let blog = sqlx::query_as::<_, Blog>(
        r#"
        SELECT id, blog_title, blog_description, blog_content, blog_thumbnail, blog_status,
               blog_author_id, published_at, blog_created_at, blog_updated_at
        FROM blogs
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(blog_id)
    .fetch_optional(conn)
    .await?;

    Ok(blog)
}

pub async fn blog_topic_ids<'e, E>(executor: E, blog_id: i64) -> Result<Vec<i64>, AppError>
where
    E: PgExecutor<'e>,
{
    let ids = sqlx::query_scalar("SELECT topic_id FROM blog_topics WHERE blog_id = $1")
        .bind(blog_id)
        .fetch_all(executor)
        .await?;

    Ok(ids)
}

/// Topics of every blog in `blog_ids`, keyed by blog id.
pub async fn topics_for_blogs(
    pool: &PgPool,
    blog_ids: &[i64],
) -> Result<HashMap<i64, Vec<Topic>>, AppError> {
    let rows = sqlx::query_as::<_, BlogTopicRow>(
        r#"
        SELECT bt.blog_id, t.id, t.topic_name, t.created_at, t.updated_at
        FROM blog_topics bt
        JOIN topics t ON t.id = bt.topic_id
        WHERE bt.blog_id = ANY($1)
        ORDER BY t.id
        "#,
    )
    .bind(blog_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<Topic>> = HashMap::new();
    for row in rows {
        grouped.entry(row.blog_id).or_default().push(row.topic);
    }
    Ok(grouped)
}

/// Public author blocks for every user in `user_ids`, keyed by user id.
pub async fn authors_by_id(
    pool: &PgPool,
    user_ids: &[i64],
) -> Result<HashMap<i64, Author>, AppError> {
    let authors = sqlx::query_as::<_, Author>(
        "SELECT id, email, role FROM users WHERE id = ANY($1)",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(authors.into_iter().map(|a| (a.id, a)).collect())
}

/// Loads the author and topics of an already fetched blog.
pub async fn with_author_and_topics(
    pool: &PgPool,
    blog: Blog,
) -> Result<BlogWithAuthorAndTopics, AppError> {
    let blog_author = authors_by_id(pool, &[blog.blog_author_id])
        .await?
        .remove(&blog.blog_author_id)
        .ok_or_else(|| AppError::InternalServerError(format!("blog {} has no author", blog.id)))?;
    let blog_topics = topics_for_blogs(pool, &[blog.id])
        .await?
        .remove(&blog.id)
        .unwrap_or_default();

    Ok(BlogWithAuthorAndTopics {
        blog,
        blog_author,
        blog_topics,
    })
}

/// Inserts the blog and its topic associations in one transaction.
/// A published blog gets its `published_at` stamped here.
pub async fn create_blog_with_topics(
    pool: &PgPool,
    new_blog: NewBlog<'_>,
    topic_ids: &[i64],
) -> Result<Blog, AppError> {
    let mut tx = pool.begin().await?;

    ensure_topics_exist(&mut *tx, topic_ids).await?;

    let blog = sqlx::query_as::<_, Blog>(
        r#"
        INSERT INTO blogs (
            blog_title, blog_description, blog_content, blog_thumbnail,
            blog_status, blog_author_id, published_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $5 = 'published'::blog_status THEN NOW() END)
        RETURNING id, blog_title, blog_description, blog_content, blog_thumbnail, blog_status,
                  blog_author_id, published_at, blog_created_at, blog_updated_at
        "#,
    )
    .bind(new_blog.blog_title)
    .bind(new_blog.blog_description)
    .bind(new_blog.blog_content)
    .bind(new_blog.blog_thumbnail)
    .bind(new_blog.blog_status)
    .bind(new_blog.blog_author_id)
    .fetch_one(&mut *tx)
    .await?;

    attach_topics(&mut *tx, blog.id, topic_ids).await?;

    tx.commit().await?;
    Ok(blog)
}

/// Associates `topic_ids` with the blog. Callers have already checked that
/// the ids exist and do not overlap the blog's current set.
pub async fn attach_topics(
    conn: &mut PgConnection,
    blog_id: i64,
    topic_ids: &[i64],
) -> Result<(), AppError> {
    if topic_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO blog_topics (blog_id, topic_id)
        SELECT $1, topic_id FROM UNNEST($2::BIGINT[]) AS topic_id
        "#,
    )
    .bind(blog_id)
    .bind(topic_ids)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes a new status. `stamp_published_at` only fills an empty
/// `published_at`; an existing first-publication instant is never moved.
pub async fn set_status(
    conn: &mut PgConnection,
    blog_id: i64,
    status: BlogStatus,
    stamp_published_at: bool,
) -> Result<Blog, AppError> {
    let blog = sqlx::query_as::<_, Blog>(
        r#"
        UPDATE blogs
        SET blog_status = $2,
            published_at = CASE WHEN $3 THEN COALESCE(published_at, NOW()) ELSE published_at END,
            blog_updated_at = NOW()
        WHERE id = $1
        RETURNING id, blog_title, blog_description, blog_content, blog_thumbnail, blog_status,
                  blog_author_id, published_at, blog_created_at, blog_updated_at
        "#,
    )
    .bind(blog_id)
    .bind(status)
    .bind(stamp_published_at)
    .fetch_one(conn)
    .await?;

    Ok(blog)
}

pub async fn delete_blog(conn: &mut PgConnection, blog_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(blog_id)
        .execute(conn)
        .await?;

    Ok(())
}
