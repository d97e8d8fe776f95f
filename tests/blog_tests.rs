// tests/blog_tests.rs

mod common;

use blog_backend::{models::user::UserRole, store::topics};
use common::{TestApp, spawn_app};
use serde_json::{Value, json};

#[tokio::test]
async fn publishing_a_draft_requires_topics() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "go").await;

    let created = app.create_blog(&author, "draft", &[]).await;
    assert_eq!(created.status().as_u16(), 201);
    let body: Value = created.json().await.unwrap();
    let blog_id = body["blog"]["id"].as_i64().unwrap();
    assert!(body["blog"]["published_at"].is_null());

    let status_url = app.url(&format!("/api/blog/{}/status", blog_id));

    let rejected = author
        .patch(&status_url)
        .json(&json!({ "blog_status": "published", "blog_topic_ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status().as_u16(), 400);
    let body: Value = rejected.json().await.unwrap();
    assert_eq!(body["message"], "topics required to publish blog");

    let published = author
        .patch(&status_url)
        .json(&json!({ "blog_status": "published", "blog_topic_ids": [topic_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(published.status().as_u16(), 200);
    let body: Value = published.json().await.unwrap();
    assert_eq!(body["blog"]["blog_status"], "published");
    let topics = body["blog"]["blog_topics"].as_array().unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0]["id"], topic_id);
    let first_published_at = body["blog"]["published_at"].clone();
    assert!(!first_published_at.is_null());

    // Archive and republish keep the first publication time.
    for status in ["archived", "published"] {
        let response = author
            .patch(&status_url)
            .json(&json!({ "blog_status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["blog"]["published_at"], first_published_at);
    }

    // Published cannot go back to draft.
    let invalid = author
        .patch(&status_url)
        .json(&json!({ "blog_status": "draft" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 400);
}

#[tokio::test]
async fn unknown_topic_aborts_publish_without_changes() {
    let Some(app) = spawn_app().await else { return };
    let (author, _) = app.signed_in_client(UserRole::User).await;

    let body: Value = app
        .create_blog(&author, "draft", &[])
        .await
        .json()
        .await
        .unwrap();
    let blog_id = body["blog"]["id"].as_i64().unwrap();

    let response = author
        .patch(app.url(&format!("/api/blog/{}/status", blog_id)))
        .json(&json!({ "blog_status": "published", "blog_topic_ids": [i64::MAX] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let (status, topic_count): (String, i64) = sqlx::query_as(
        r#"
        SELECT b.blog_status::TEXT, (SELECT COUNT(*) FROM blog_topics WHERE blog_id = b.id)
        FROM blogs b WHERE b.id = $1
        "#,
    )
    .bind(blog_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(status, "draft");
    assert_eq!(topic_count, 0);
}

#[tokio::test]
async fn published_blog_needs_topics_at_creation() {
    let Some(app) = spawn_app().await else { return };
    let (author, _) = app.signed_in_client(UserRole::User).await;

    let response = app.create_blog(&author, "published", &[]).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn only_the_author_changes_status() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let (stranger, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "authz").await;

    let body: Value = app
        .create_blog(&author, "published", &[topic_id])
        .await
        .json()
        .await
        .unwrap();
    let blog_id = body["blog"]["id"].as_i64().unwrap();

    let archive = stranger
        .patch(app.url(&format!("/api/blog/{}/status", blog_id)))
        .json(&json!({ "blog_status": "archived" }))
        .send()
        .await
        .unwrap();
    assert_eq!(archive.status().as_u16(), 401);

    let delete = stranger
        .delete(app.url(&format!("/api/blog/{}", blog_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 401);

    let delete = author
        .delete(app.url(&format!("/api/blog/{}", blog_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 200);
}

#[tokio::test]
async fn likes_toggle_and_show_up_in_topic_feed() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let (reader_a, _) = app.signed_in_client(UserRole::User).await;
    let (reader_b, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "feed").await;

    let body: Value = app
        .create_blog(&author, "published", &[topic_id])
        .await
        .json()
        .await
        .unwrap();
    let blog_id = body["blog"]["id"].as_i64().unwrap();
    let like_url = app.url(&format!("/api/blog/{}/like", blog_id));

    for reader in [&reader_a, &reader_b] {
        let body: Value = reader.post(&like_url).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["action"], "added");
    }

    let feed: Value = reqwest::get(app.url(&format!("/api/topic/{}/blogs", topic_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let blogs = feed["blogs"].as_array().unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0]["id"], blog_id);
    assert_eq!(blogs[0]["blog_likes_count"], 2);
    assert!(blogs[0]["activity_score"].as_f64().unwrap() > 0.0);
    assert_eq!(feed["no_of_pages"], 1);

    // Liking again removes the like instead of double counting.
    let body: Value = reader_a.post(&like_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["action"], "removed");
    assert_eq!(body["blog_likes_count"], 1);
}

#[tokio::test]
async fn drafts_are_left_out_of_feeds() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "drafts").await;

    let body: Value = app
        .create_blog(&author, "published", &[topic_id])
        .await
        .json()
        .await
        .unwrap();
    let blog_id = body["blog"]["id"].as_i64().unwrap();
    author
        .patch(app.url(&format!("/api/blog/{}/status", blog_id)))
        .json(&json!({ "blog_status": "archived" }))
        .send()
        .await
        .unwrap();

    let feed: Value = reqwest::get(app.url(&format!("/api/topic/{}/blogs", topic_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(feed["blogs"].as_array().unwrap().is_empty());
    assert_eq!(feed["no_of_pages"], 0);
}

#[tokio::test]
async fn followed_topics_drive_the_personal_feed() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let (reader, _) = app.signed_in_client(UserRole::User).await;
    let followed = app.create_topic(&admin, "followed").await;
    let ignored = app.create_topic(&admin, "ignored").await;

    let mut blog_ids = Vec::new();
    for topic in [followed, ignored] {
        let body: Value = app
            .create_blog(&author, "published", &[topic])
            .await
            .json()
            .await
            .unwrap();
        blog_ids.push(body["blog"]["id"].as_i64().unwrap());
    }

    let follow: Value = reader
        .post(app.url(&format!("/api/topic/{}/follow", followed)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(follow["action"], "added");

    let feed: Value = reader
        .get(app.url("/api/blog/feed?limit=100"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = feed["blogs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&blog_ids[0]));
    assert!(!ids.contains(&blog_ids[1]));
}

#[tokio::test]
async fn replies_attach_to_top_level_comments() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let (reader, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "threads").await;

    let body: Value = app
        .create_blog(&author, "published", &[topic_id])
        .await
        .json()
        .await
        .unwrap();
    let blog_id = body["blog"]["id"].as_i64().unwrap();

    let comment = |parent: Option<i64>, text: &str| {
        reader
            .post(app.url("/api/blog-comment"))
            .json(&json!({
                "blog_id": blog_id,
                "blog_comment": text,
                "parent_comment_id": parent,
            }))
            .send()
    };

    let top: Value = comment(None, "first!").await.unwrap().json().await.unwrap();
    let top_id = top["blog_comment"]["id"].as_i64().unwrap();

    let reply: Value = comment(Some(top_id), "reply").await.unwrap().json().await.unwrap();
    let reply_id = reply["blog_comment"]["id"].as_i64().unwrap();
    assert_eq!(reply["blog_comment"]["parent_comment_id"], top_id);

    let nested: Value = comment(Some(reply_id), "nested").await.unwrap().json().await.unwrap();
    assert_eq!(nested["blog_comment"]["parent_comment_id"], top_id);

    let blank = comment(None, "   ").await.unwrap();
    assert_eq!(blank.status().as_u16(), 400);

    let listing: Value = reqwest::get(app.url(&format!("/api/blog/{}/blog-comments", blog_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let top_level = listing["blog_comments"].as_array().unwrap();
    assert_eq!(top_level.len(), 1);
    assert_eq!(top_level[0]["comment_replies_count"], 2);

    let replies: Value = reqwest::get(app.url(&format!("/api/blog-comment/{}/comments", top_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replies["blog_comments"].as_array().unwrap().len(), 2);

    // Only the comment author may edit it.
    let edit = author
        .put(app.url(&format!("/api/blog-comment/{}", top_id)))
        .json(&json!({ "blog_comment": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status().as_u16(), 401);

    // Deleting the top-level comment removes its replies.
    let deleted = reader
        .delete(app.url(&format!("/api/blog-comment/{}", top_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);
    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_comments WHERE blog_id = $1")
        .bind(blog_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

async fn published_blog(app: &TestApp, author: &reqwest::Client, topic_ids: &[i64]) -> i64 {
    let body: Value = app
        .create_blog(author, "published", topic_ids)
        .await
        .json()
        .await
        .unwrap();
    body["blog"]["id"].as_i64().unwrap()
}

async fn feed_of(client: &reqwest::Client, url: String) -> Vec<Value> {
    let body: Value = client.get(url).send().await.unwrap().json().await.unwrap();
    body["blogs"].as_array().unwrap().clone()
}

#[tokio::test]
async fn concurrent_topic_deletes_keep_a_topic_on_published_blogs() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;

    for _ in 0..10 {
        let a = app.create_topic(&admin, "race-a").await;
        let b = app.create_topic(&admin, "race-b").await;
        let blog_id = published_blog(&app, &author, &[a, b]).await;

        let (first, second) = tokio::join!(
            topics::delete_topic(&app.pool, a),
            topics::delete_topic(&app.pool, b),
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1,
            "exactly one of the two deletes must win"
        );

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blog_topics WHERE blog_id = $1")
                .bind(blog_id)
                .fetch_one(&app.pool)
                .await
                .unwrap();
        assert_eq!(remaining, 1);
    }
}

#[tokio::test]
async fn comments_of_hidden_blogs_are_out_of_reach() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let (stranger, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "hidden").await;
    let blog_id = published_blog(&app, &author, &[topic_id]).await;

    let created: Value = author
        .post(app.url("/api/blog-comment"))
        .json(&json!({ "blog_id": blog_id, "blog_comment": "note to self" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let comment_id = created["blog_comment"]["id"].as_i64().unwrap();

    author
        .patch(app.url(&format!("/api/blog/{}/status", blog_id)))
        .json(&json!({ "blog_status": "archived" }))
        .send()
        .await
        .unwrap();

    let replies_url = app.url(&format!("/api/blog-comment/{}/comments", comment_id));
    let like_url = app.url(&format!("/api/blog-comment/{}/like", comment_id));

    let anonymous = reqwest::get(&replies_url).await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 400);
    let listed = stranger.get(&replies_url).send().await.unwrap();
    assert_eq!(listed.status().as_u16(), 400);
    let liked = stranger.post(&like_url).send().await.unwrap();
    assert_eq!(liked.status().as_u16(), 400);

    // The author still sees their own archived blog.
    let own = author.get(&replies_url).send().await.unwrap();
    assert_eq!(own.status().as_u16(), 200);
    let own_like = author.post(&like_url).send().await.unwrap();
    assert_eq!(own_like.status().as_u16(), 200);
}

#[tokio::test]
async fn feed_orders_by_engagement_over_age() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "ranking").await;

    let newer = published_blog(&app, &author, &[topic_id]).await;
    let older = published_blog(&app, &author, &[topic_id]).await;
    for (blog_id, hours) in [(newer, 2), (older, 3)] {
        sqlx::query("UPDATE blogs SET published_at = NOW() - make_interval(hours => $2) WHERE id = $1")
            .bind(blog_id)
            .bind(hours)
            .execute(&app.pool)
            .await
            .unwrap();
    }

    let mut readers = Vec::new();
    for _ in 0..3 {
        readers.push(app.signed_in_client(UserRole::User).await.0);
    }
    let like = |client: &reqwest::Client, blog_id: i64| {
        client
            .post(app.url(&format!("/api/blog/{}/like", blog_id)))
            .send()
    };

    // Equal engagement: the fresher blog wins.
    like(&readers[0], newer).await.unwrap();
    like(&readers[0], older).await.unwrap();
    let topic_feed = app.url(&format!("/api/topic/{}/blogs", topic_id));
    let ids: Vec<i64> = feed_of(&readers[0], topic_feed.clone())
        .await
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![newer, older]);

    // Three likes at 3h (0.9 / 180²) outrank one like at 2h (0.3 / 120²).
    like(&readers[1], older).await.unwrap();
    like(&readers[2], older).await.unwrap();
    let ranked = feed_of(&readers[0], topic_feed).await;
    let ids: Vec<i64> = ranked.iter().map(|b| b["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![older, newer]);
    assert!(ranked[0]["activity_score"].as_f64().unwrap() > ranked[1]["activity_score"].as_f64().unwrap());
}

#[tokio::test]
async fn feed_counters_skip_replies_and_toggle_bookmarks() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let (reader, _) = app.signed_in_client(UserRole::User).await;
    let topic_id = app.create_topic(&admin, "counters").await;
    let blog_id = published_blog(&app, &author, &[topic_id]).await;

    let top: Value = reader
        .post(app.url("/api/blog-comment"))
        .json(&json!({ "blog_id": blog_id, "blog_comment": "top" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let top_id = top["blog_comment"]["id"].as_i64().unwrap();
    reader
        .post(app.url("/api/blog-comment"))
        .json(&json!({ "blog_id": blog_id, "blog_comment": "reply", "parent_comment_id": top_id }))
        .send()
        .await
        .unwrap();

    let bookmark_url = app.url(&format!("/api/blog/{}/bookmark", blog_id));
    let body: Value = reader.post(&bookmark_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["action"], "added");

    let comment_like_url = app.url(&format!("/api/blog-comment/{}/like", top_id));
    let body: Value = reader.post(&comment_like_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["action"], "added");
    assert_eq!(body["comment_likes_count"], 1);

    let topic_feed = app.url(&format!("/api/topic/{}/blogs", topic_id));
    let blogs = feed_of(&reader, topic_feed.clone()).await;
    assert_eq!(blogs[0]["blog_comments_count"], 1);
    assert_eq!(blogs[0]["blog_bookmarks_count"], 1);

    let body: Value = reader.post(&bookmark_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["action"], "removed");
    let body: Value = reader.post(&comment_like_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["action"], "removed");
    assert_eq!(body["comment_likes_count"], 0);

    let blogs = feed_of(&reader, topic_feed).await;
    assert_eq!(blogs[0]["blog_bookmarks_count"], 0);
}

#[tokio::test]
async fn blog_in_two_followed_topics_appears_once() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let (reader, _) = app.signed_in_client(UserRole::User).await;
    let first = app.create_topic(&admin, "twice-a").await;
    let second = app.create_topic(&admin, "twice-b").await;
    let blog_id = published_blog(&app, &author, &[first, second]).await;

    for topic in [first, second] {
        reader
            .post(app.url(&format!("/api/topic/{}/follow", topic)))
            .send()
            .await
            .unwrap();
    }

    let blogs = feed_of(&reader, app.url("/api/blog/feed?limit=100")).await;
    let hits = blogs.iter().filter(|b| b["id"] == blog_id).count();
    assert_eq!(hits, 1);
}

#[tokio::test]
async fn fallback_feed_ignores_unfollowed_topics() {
    let Some(app) = spawn_app().await else { return };
    let (admin, _) = app.signed_in_client(UserRole::Admin).await;
    let (author, _) = app.signed_in_client(UserRole::User).await;
    let lonely = app.create_topic(&admin, "lonely").await;
    let blog_id = published_blog(&app, &author, &[lonely]).await;

    // No signed-in reader, so the feed falls back to the most followed topics.
    let blogs = feed_of(&reqwest::Client::new(), app.url("/api/blog/feed?limit=100")).await;
    assert!(blogs.iter().all(|b| b["id"] != blog_id));
}
