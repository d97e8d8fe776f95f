// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Session lifetime: 2 days.
pub const DEFAULT_JWT_EXPIRATION_SECS: u64 = 60 * 60 * 24 * 2;

/// How long an activation invitation stays valid.
pub const INVITATION_TTL_MINUTES: i64 = 15;

/// Attempts per outbound email, both inline and in the worker.
pub const MAX_EMAIL_ATTEMPTS: u32 = 3;

/// A blog may carry at most this many topics.
pub const MAX_TOPICS_PER_BLOG: usize = 5;

/// Number of most-followed topics used for the anonymous feed.
pub const FEED_TOP_FOLLOWED_TOPICS: i64 = 10;

/// How registration hands off the activation email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailDelivery {
    /// Send inline, retrying before the response is written.
    Direct,
    /// Enqueue for the email worker.
    Queue,
}

impl EmailDelivery {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "queue" => EmailDelivery::Queue,
            _ => EmailDelivery::Direct,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub client_url: String,
    pub cookie_secure: bool,
    pub email_delivery: EmailDelivery,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub request_timeout: Duration,
    pub statement_timeout_ms: u64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_JWT_EXPIRATION_SECS);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let client_url =
            env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let email_delivery = env::var("EMAIL_DELIVERY")
            .map(|v| EmailDelivery::parse(&v))
            .unwrap_or(EmailDelivery::Direct);

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.is_empty() => Some(SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(587),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            }),
            _ => None,
        };

        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string());

        let request_timeout = Duration::from_secs(
            env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
        );

        let statement_timeout_ms = env::var("DB_STATEMENT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            client_url,
            cookie_secure,
            email_delivery,
            smtp,
            mail_from,
            request_timeout,
            statement_timeout_ms,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }

    /// Link embedded in the activation email.
    pub fn activation_url(&self, plain_token: &str) -> String {
        format!(
            "{}/activate-account/{}",
            self.client_url.trim_end_matches('/'),
            plain_token
        )
    }
}
