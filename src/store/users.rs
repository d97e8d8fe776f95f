// src/store/users.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::user::{User, UserInvitation, UserRole},
    store::is_unique_violation,
};

pub async fn get_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password, is_verified, role, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_verified_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password, is_verified, role, created_at, updated_at
        FROM users
        WHERE email = $1 AND is_verified = TRUE
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Creates an unverified user together with its activation invitation.
///
/// Re-registering an email that is still unverified replaces the password
/// hash and any pending invitation, which doubles as "resend activation".
/// A verified owner of the email makes the whole call fail with no writes.
pub async fn create_user_and_invite(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    token_hash: &str,
    expiration: DateTime<Utc>,
) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password)
        VALUES ($1, $2)
        ON CONFLICT (email) DO UPDATE
            SET password = EXCLUDED.password, updated_at = NOW()
            WHERE users.is_verified = FALSE
        RETURNING id, email, password, is_verified, role, created_at, updated_at
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::BadRequest("user already exists".to_string()))?;

    sqlx::query("DELETE FROM user_invitations WHERE user_id = $1")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO user_invitations (token, user_id, expiration) VALUES ($1, $2, $3)")
        .bind(token_hash)
        .bind(user.id)
        .bind(expiration)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(user)
}

/// Consumes an invitation: look up a live token, verify its user, delete it.
/// All three steps commit together or not at all.
pub async fn activate_user(pool: &PgPool, token_hash: &str) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;

    let invitation = sqlx::query_as::<_, UserInvitation>(
        r#"
        SELECT token, user_id, expiration
        FROM user_invitations
        WHERE token = $1 AND expiration > NOW()
        FOR UPDATE
        "#,
    )
    .bind(token_hash)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::BadRequest("invalid or expired activation token".to_string()))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET is_verified = TRUE, updated_at = NOW()
        WHERE id = $1
        RETURNING id, email, password, is_verified, role, created_at, updated_at
        "#,
    )
    .bind(invitation.user_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM user_invitations WHERE user_id = $1")
        .bind(invitation.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(user)
}

/// Inserts an already verified user (seed CLI and admin bootstrap).
pub async fn create_verified_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    role: UserRole,
) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password, is_verified, role)
        VALUES ($1, $2, TRUE, $3)
        RETURNING id, email, password, is_verified, role, created_at, updated_at
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest("user already exists".to_string())
        } else {
            AppError::from(e)
        }
    })
}
