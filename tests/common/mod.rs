// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blog_backend::{
    config::{Config, EmailDelivery},
    error::AppError,
    mailer::Mailer,
    models::{email::VerificationMail, user::UserRole},
    routes,
    state::AppState,
    store::users,
    utils::{hash::hash_password, jwt::SessionKeys},
};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub const PASSWORD: &str = "Passw0rd!";

/// Keeps every activation email instead of sending it.
#[derive(Default)]
pub struct CapturingMailer {
    pub sent: Mutex<Vec<VerificationMail>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_verification(&self, mail: &VerificationMail) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: PgPool,
    pub mailer: Arc<CapturingMailer>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Plaintext token from the last activation email sent to `email`.
    pub fn activation_token_for(&self, email: &str) -> String {
        let sent = self.mailer.sent.lock().unwrap();
        let mail = sent
            .iter()
            .rev()
            .find(|m| m.email == email)
            .expect("no activation email captured");
        mail.activation_url
            .rsplit('/')
            .next()
            .expect("activation url has no token")
            .to_string()
    }

    /// Inserts a verified user and returns a client signed in as them.
    pub async fn signed_in_client(&self, role: UserRole) -> (reqwest::Client, i64) {
        let email = unique_email();
        let hashed = hash_password(PASSWORD).unwrap();
        let user = users::create_verified_user(&self.pool, &email, &hashed, role)
            .await
            .unwrap();

        let client = cookie_client();
        let response = client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);

        (client, user.id)
    }

    /// Creates a topic with a unique name through the admin API.
    pub async fn create_topic(&self, admin: &reqwest::Client, prefix: &str) -> i64 {
        let name = format!("{}-{}", prefix, &uuid::Uuid::new_v4().to_string()[..8]);
        let body: Value = admin
            .post(self.url("/api/topic"))
            .json(&json!({ "topic_name": name }))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();
        body["topic"]["id"].as_i64().expect("topic id missing")
    }

    pub async fn create_blog(
        &self,
        author: &reqwest::Client,
        status: &str,
        topic_ids: &[i64],
    ) -> reqwest::Response {
        author
            .post(self.url("/api/blog"))
            .json(&json!({
                "blog_title": "Borrowing without tears",
                "blog_content": {"blocks": [{"type": "paragraph", "text": "..."}]},
                "blog_status": status,
                "blog_topic_ids": topic_ids,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

pub fn unique_email() -> String {
    format!("u{}@example.com", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

/// Spawns the app on a random port against `DATABASE_URL`.
/// Returns `None` (and the test passes vacuously) when no database is configured.
pub async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        client_url: "http://localhost:5173".to_string(),
        cookie_secure: false,
        email_delivery: EmailDelivery::Direct,
        smtp: None,
        mail_from: "no-reply@localhost".to_string(),
        request_timeout: Duration::from_secs(15),
        statement_timeout_ms: 5000,
        admin_email: None,
        admin_password: None,
    };

    let mailer = Arc::new(CapturingMailer::default());
    let state = AppState {
        pool: pool.clone(),
        keys: SessionKeys::new(config.jwt_secret.as_bytes(), config.jwt_expiration),
        config,
        mailer: mailer.clone(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        mailer,
    })
}
