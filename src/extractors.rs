// src/extractors.rs
//
// Authenticated principals, resolved from the `auth_token` cookie and passed
// to handlers as ordinary typed arguments.

use axum::{extract::FromRef, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::user::User,
    store::users,
    utils::jwt::{SESSION_COOKIE, SessionKeys},
};

/// A request carrying a valid session. Rejects with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Like [`AuthUser`] but never rejects; anonymous requests get `None`.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<i64>);

/// A signed-in user whose stored role is `admin`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn session_user_id(parts: &Parts, keys: &SessionKeys) -> Option<Result<i64, AppError>> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| keys.verify(cookie.value()))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let user_id = session_user_id(parts, &keys)
            .ok_or_else(|| AppError::AuthError("unauthorized".to_string()))??;

        Ok(AuthUser { user_id })
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let user_id = session_user_id(parts, &keys).and_then(Result::ok);

        Ok(MaybeAuthUser(user_id))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
    PgPool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser { user_id } = AuthUser::from_request_parts(parts, state).await?;
        let pool = PgPool::from_ref(state);

        let user = users::get_user_by_id(&pool, user_id)
            .await?
            .ok_or_else(|| AppError::AuthError("unauthorized".to_string()))?;

        if !user.is_admin() {
            tracing::warn!(user_id, "Non-admin attempted an admin action");
            return Err(AppError::AuthError("unauthorized".to_string()));
        }

        Ok(AdminUser(user))
    }
}
