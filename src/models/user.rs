// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::validation::{validate_email_format, validate_strong_password};

/// Role stored in the `user_role` Postgres enum. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique, lower-cased email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Set exactly once, by consuming an activation invitation.
    pub is_verified: bool,

    pub role: UserRole,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Public author block embedded in blog and comment payloads.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

/// Represents the 'user_invitations' table. `token` is the SHA-256 of the
/// plaintext sent by email.
#[derive(Debug, Clone, FromRow)]
pub struct UserInvitation {
    pub token: String,
    pub user_id: i64,
    pub expiration: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(custom(function = validate_email_format))]
    pub email: String,
    #[validate(
        length(max = 128, message = "Password must be at most 128 characters."),
        custom(function = validate_strong_password)
    )]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginUserRequest {
    #[validate(length(min = 1, max = 254, message = "email and password are required"))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "email and password are required"))]
    pub password: String,
}
