// src/publication.rs
//
// Blog status transitions and the topic rules attached to them.
//
//   draft     -> published   needs at least one topic afterwards
//   published -> archived
//   archived  -> published   keeps the original published_at

use std::collections::HashSet;

use sqlx::PgPool;

use crate::{
    config::MAX_TOPICS_PER_BLOG,
    error::AppError,
    models::blog::{Blog, BlogStatus, BlogWithAuthorAndTopics},
    store::{blogs, topics::ensure_topics_exist},
};

/// What a validated transition will write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: BlogStatus,
    /// Topics to associate before the status flips.
    pub add_topic_ids: Vec<i64>,
    /// Fill `published_at` if it is still empty.
    pub stamp_published_at: bool,
}

/// Decides whether `current -> requested` is allowed and what it writes.
///
/// `existing` is the blog's current topic set, `supplied` the ids sent with
/// the request. Supplied ids only matter when a draft is published.
pub fn plan_transition(
    current: BlogStatus,
    requested: BlogStatus,
    existing: &[i64],
    supplied: &[i64],
) -> Result<Transition, AppError> {
    match (current, requested) {
        (BlogStatus::Draft, BlogStatus::Published) => {
            let existing_set: HashSet<i64> = existing.iter().copied().collect();
            if supplied.iter().any(|id| existing_set.contains(id)) {
                return Err(AppError::BadRequest("topic already exists".to_string()));
            }
            if existing.is_empty() && supplied.is_empty() {
                return Err(AppError::BadRequest(
                    "topics required to publish blog".to_string(),
                ));
            }
            if existing.len() + supplied.len() > MAX_TOPICS_PER_BLOG {
                return Err(AppError::BadRequest(format!(
                    "a blog can have max {} no of topics",
                    MAX_TOPICS_PER_BLOG
                )));
            }
            Ok(Transition {
                to: BlogStatus::Published,
                add_topic_ids: supplied.to_vec(),
                stamp_published_at: true,
            })
        }
        (BlogStatus::Published, BlogStatus::Archived)
        | (BlogStatus::Archived, BlogStatus::Published) => Ok(Transition {
            to: requested,
            add_topic_ids: Vec::new(),
            stamp_published_at: false,
        }),
        (current, _) => Err(AppError::BadRequest(format!(
            "cannot update blog status with current blog status {}",
            current
        ))),
    }
}

/// Runs a status change for `actor_id` as a single transaction: lock the blog,
/// check authorship, plan, validate new topics, attach them, flip the status.
pub async fn change_status(
    pool: &PgPool,
    actor_id: i64,
    blog_id: i64,
    requested: BlogStatus,
    supplied_topic_ids: &[i64],
) -> Result<BlogWithAuthorAndTopics, AppError> {
    let mut tx = pool.begin().await?;

    let blog = blogs::lock_blog(&mut *tx, blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog does not exist".to_string()))?;

    if blog.blog_author_id != actor_id {
        return Err(AppError::AuthError("unauthorized".to_string()));
    }

    let existing = blogs::blog_topic_ids(&mut *tx, blog_id).await?;
    let transition = plan_transition(blog.blog_status, requested, &existing, supplied_topic_ids)?;

    ensure_topics_exist(&mut *tx, &transition.add_topic_ids).await?;
    blogs::attach_topics(&mut *tx, blog_id, &transition.add_topic_ids).await?;
    let updated = blogs::set_status(
        &mut *tx,
        blog_id,
        transition.to,
        transition.stamp_published_at,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        blog_id,
        from = %blog.blog_status,
        to = %updated.blog_status,
        "Blog status changed"
    );

    blogs::with_author_and_topics(pool, updated).await
}

/// A blog readers may interact with: published, or any status for its author.
pub async fn visible_blog(
    pool: &PgPool,
    blog_id: i64,
    viewer_id: Option<i64>,
) -> Result<Blog, AppError> {
    let blog = blogs::get_blog(pool, blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog does not exist".to_string()))?;

    if blog.blog_status != BlogStatus::Published && viewer_id != Some(blog.blog_author_id) {
        return Err(AppError::NotFound("blog does not exist".to_string()));
    }
    Ok(blog)
}

/// Author-only delete. Comments, likes, bookmarks and topic links cascade.
pub async fn delete_blog(pool: &PgPool, actor_id: i64, blog_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let blog = blogs::lock_blog(&mut *tx, blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog does not exist".to_string()))?;

    if blog.blog_author_id != actor_id {
        return Err(AppError::AuthError("unauthorized".to_string()));
    }

    blogs::delete_blog(&mut *tx, blog_id).await?;
    tx.commit().await?;

    tracing::info!(blog_id, "Blog deleted");
    Ok(())
}
