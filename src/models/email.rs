// src/models/email.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Activation email payload. Also the JSON body of a queued email job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMail {
    pub subject: String,
    pub email: String,
    pub activation_url: String,
}

impl VerificationMail {
    pub fn new(email: &str, activation_url: String) -> Self {
        Self {
            subject: "Verify your account".to_string(),
            email: email.to_string(),
            activation_url,
        }
    }

    pub fn html_body(&self) -> String {
        format!(
            "<p>Welcome!</p>\
             <p>Confirm <b>{}</b> by opening the link below within 15 minutes:</p>\
             <p><a href=\"{url}\">{url}</a></p>",
            self.email,
            url = self.activation_url
        )
    }
}

/// Represents the 'email_jobs' table.
#[derive(Debug, Clone, FromRow)]
pub struct EmailJob {
    pub id: i64,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub locked_until: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
