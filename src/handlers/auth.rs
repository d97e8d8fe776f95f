// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::{Config, EmailDelivery, INVITATION_TTL_MINUTES, MAX_EMAIL_ATTEMPTS},
    error::AppError,
    extractors::AuthUser,
    mailer::deliver_with_retry,
    models::{
        email::VerificationMail,
        user::{LoginUserRequest, RegisterUserRequest},
    },
    queue,
    state::AppState,
    store::users,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{SESSION_COOKIE, SessionKeys},
        token::{generate_activation_token, hash_token},
        validation::normalize_email,
    },
};

/// HTTP-only session cookie holding a freshly signed token.
fn session_cookie(config: &Config, keys: &SessionKeys, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .secure(config.cookie_secure)
        .same_site(if config.cookie_secure {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .max_age(time::Duration::seconds(keys.ttl_seconds() as i64))
        .build()
}

/// Registers an unverified user and sends the activation link.
///
/// In direct mode the email is retried inline and a final failure fails the
/// request, although the user and invitation are already stored. In queue
/// mode the email is handed to the worker.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let hashed_password = hash_password(&payload.password)?;
    let token = generate_activation_token();
    let expiration = chrono::Utc::now() + chrono::Duration::minutes(INVITATION_TTL_MINUTES);

    let user = users::create_user_and_invite(
        &state.pool,
        &email,
        &hashed_password,
        &token.hashed,
        expiration,
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered, awaiting activation");

    let mail = VerificationMail::new(&user.email, state.config.activation_url(&token.plain));
    match state.config.email_delivery {
        EmailDelivery::Direct => {
            deliver_with_retry(state.mailer.as_ref(), &mail, MAX_EMAIL_ATTEMPTS).await?
        }
        EmailDelivery::Queue => {
            queue::enqueue(&state.pool, &mail).await?;
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "user registered successfully, please verify your email",
        })),
    ))
}

/// Consumes an activation token and signs the user in.
pub async fn activate(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::activate_user(&state.pool, &hash_token(token.trim())).await?;
    let session = state.keys.sign(user.id)?;

    tracing::info!(user_id = user.id, "User activated");

    Ok((
        jar.add(session_cookie(&state.config, &state.keys, session)),
        Json(json!({
            "success": true,
            "message": "user activated successfully",
            "user": user,
        })),
    ))
}

/// Checks credentials of a verified user and issues the session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invalid = || AppError::BadRequest("invalid email or password".to_string());

    let user = users::get_verified_user_by_email(&state.pool, &normalize_email(&payload.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        tracing::warn!(user_id = user.id, "Failed login attempt");
        return Err(invalid());
    }

    let session = state.keys.sign(user.id)?;

    Ok((
        jar.add(session_cookie(&state.config, &state.keys, session)),
        Json(json!({
            "success": true,
            "message": "user logged in successfully",
            "user": user,
        })),
    ))
}

/// Returns the signed-in user.
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = users::get_user_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::AuthError("unauthorized".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "user": user,
    })))
}
