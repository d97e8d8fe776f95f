// src/feed.rs
//
// Ranked blog listings. Every scope is first resolved to a set of topic ids,
// then one query scores the published blogs tagged with any of them:
//
//   score = (0.3 * likes + 0.5 * top-level comments + 0.2 * bookmarks)
//           / minutes_since_published^2

use sqlx::{FromRow, PgPool};

use crate::{
    config::FEED_TOP_FOLLOWED_TOPICS,
    error::AppError,
    models::blog::{Blog, BlogWithMetadata},
    store::{blogs, topics},
    utils::pagination::Pagination,
};

pub const LIKE_WEIGHT: f64 = 0.3;
pub const COMMENT_WEIGHT: f64 = 0.5;
pub const BOOKMARK_WEIGHT: f64 = 0.2;

/// Which blogs are eligible for a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Blogs tagged with one topic.
    Topic(i64),
    /// Blogs tagged with any of the N most followed topics.
    TopFollowedTopics(i64),
    /// Blogs tagged with any topic the user follows.
    FollowedBy(i64),
}

/// Score of a blog with the given engagement, `age_seconds` after its first
/// publication. Ages under one second are treated as one second.
pub fn activity_score(likes: i64, top_level_comments: i64, bookmarks: i64, age_seconds: f64) -> f64 {
    let minutes = age_seconds.max(1.0) / 60.0;
    let engagement = LIKE_WEIGHT * likes as f64
        + COMMENT_WEIGHT * top_level_comments as f64
        + BOOKMARK_WEIGHT * bookmarks as f64;
    engagement / (minutes * minutes)
}

#[derive(FromRow)]
struct RankedRow {
    #[sqlx(flatten)]
    blog: Blog,
    blog_likes_count: i64,
    blog_comments_count: i64,
    blog_bookmarks_count: i64,
    activity_score: f64,
}

// Mirrors `activity_score`; `$2..$4` carry the weights.
const RANKED_BLOGS_SQL: &str = r#"
    WITH scoped AS (
        SELECT DISTINCT bt.blog_id
        FROM blog_topics bt
        WHERE bt.topic_id = ANY($1)
    ),
    counted AS (
        SELECT b.id, b.blog_title, b.blog_description, b.blog_content, b.blog_thumbnail,
               b.blog_status, b.blog_author_id, b.published_at, b.blog_created_at,
               b.blog_updated_at,
               (SELECT COUNT(DISTINCT l.liked_by_id)
                  FROM blog_likes l
                 WHERE l.liked_blog_id = b.id) AS blog_likes_count,
               (SELECT COUNT(*)
                  FROM blog_comments c
                 WHERE c.blog_id = b.id AND c.parent_comment_id IS NULL) AS blog_comments_count,
               (SELECT COUNT(DISTINCT m.bookmarked_by_id)
                  FROM blog_bookmarks m
                 WHERE m.bookmarked_blog_id = b.id) AS blog_bookmarks_count,
               GREATEST(EXTRACT(EPOCH FROM (NOW() - b.published_at))::FLOAT8, 1.0) / 60.0
                   AS age_minutes
        FROM blogs b
        JOIN scoped s ON s.blog_id = b.id
        WHERE b.blog_status = 'published' AND b.published_at IS NOT NULL
    )
    SELECT id, blog_title, blog_description, blog_content, blog_thumbnail, blog_status,
           blog_author_id, published_at, blog_created_at, blog_updated_at,
           blog_likes_count, blog_comments_count, blog_bookmarks_count,
           (($2::FLOAT8 * blog_likes_count
             + $3::FLOAT8 * blog_comments_count
             + $4::FLOAT8 * blog_bookmarks_count)
            / (age_minutes * age_minutes))::FLOAT8 AS activity_score
    FROM counted
    ORDER BY activity_score DESC, published_at DESC, id DESC
    LIMIT $5 OFFSET $6
"#;

const COUNT_SCOPED_SQL: &str = r#"
    SELECT COUNT(DISTINCT b.id)
    FROM blogs b
    JOIN blog_topics bt ON bt.blog_id = b.id
    WHERE bt.topic_id = ANY($1)
      AND b.blog_status = 'published'
      AND b.published_at IS NOT NULL
"#;

/// Resolves a scope to the topic ids whose blogs it covers.
async fn scope_topic_ids(pool: &PgPool, scope: FeedScope) -> Result<Vec<i64>, AppError> {
    match scope {
        FeedScope::Topic(topic_id) => Ok(vec![topic_id]),
        FeedScope::TopFollowedTopics(n) => topics::most_followed_topic_ids(pool, n).await,
        FeedScope::FollowedBy(user_id) => topics::followed_topic_ids(pool, user_id).await,
    }
}

/// Scope for `GET /blog/feed`: the caller's followed topics when they follow
/// any, otherwise the most followed topics overall.
pub async fn personal_scope(pool: &PgPool, user_id: Option<i64>) -> Result<FeedScope, AppError> {
    if let Some(user_id) = user_id {
        if !topics::followed_topic_ids(pool, user_id).await?.is_empty() {
            return Ok(FeedScope::FollowedBy(user_id));
        }
    }
    Ok(FeedScope::TopFollowedTopics(FEED_TOP_FOLLOWED_TOPICS))
}

/// One page of published blogs in `scope`, highest score first, with the
/// total number of eligible blogs.
pub async fn rank_blogs(
    pool: &PgPool,
    scope: FeedScope,
    pagination: Pagination,
) -> Result<(Vec<BlogWithMetadata>, i64), AppError> {
    let topic_ids = scope_topic_ids(pool, scope).await?;
    if topic_ids.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let rows = sqlx::query_as::<_, RankedRow>(RANKED_BLOGS_SQL)
        .bind(&topic_ids)
        .bind(LIKE_WEIGHT)
        .bind(COMMENT_WEIGHT)
        .bind(BOOKMARK_WEIGHT)
        .bind(pagination.limit)
        .bind(pagination.skip())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar(COUNT_SCOPED_SQL)
        .bind(&topic_ids)
        .fetch_one(pool)
        .await?;

    let blog_ids: Vec<i64> = rows.iter().map(|r| r.blog.id).collect();
    let author_ids: Vec<i64> = rows.iter().map(|r| r.blog.blog_author_id).collect();
    let mut topics_by_blog = blogs::topics_for_blogs(pool, &blog_ids).await?;
    let authors = blogs::authors_by_id(pool, &author_ids).await?;

    let mut ranked = Vec::with_capacity(rows.len());
    for row in rows {
        let blog_author = authors.get(&row.blog.blog_author_id).cloned().ok_or_else(|| {
            AppError::InternalServerError(format!("blog {} has no author", row.blog.id))
        })?;
        ranked.push(BlogWithMetadata {
            blog_topics: topics_by_blog.remove(&row.blog.id).unwrap_or_default(),
            blog: row.blog,
            blog_author,
            blog_likes_count: row.blog_likes_count,
            blog_comments_count: row.blog_comments_count,
            blog_bookmarks_count: row.blog_bookmarks_count,
            activity_score: row.activity_score,
        });
    }

    tracing::debug!(?scope, total, returned = ranked.len(), "Ranked feed");
    Ok((ranked, total))
}
