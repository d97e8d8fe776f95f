// src/utils/jwt.rs

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Name of the HTTP-only cookie carrying the session token.
pub const SESSION_COOKIE: &str = "auth_token";

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signing material for session tokens.
///
/// Built once at startup from the configured secret and handed to the router
/// through `AppState`; nothing reads the secret from the environment later.
#[derive(Clone)]
pub struct SessionKeys {
    inner: Arc<KeyPair>,
    ttl_seconds: u64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        Self {
            inner: Arc::new(KeyPair {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Signs a new session token for the user.
    pub fn sign(&self, user_id: i64) -> Result<String, AppError> {
        // Calculate expiration: current time + ttl
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
            .as_secs() as usize
            + self.ttl_seconds as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)
            .map_err(|e| AppError::InternalServerError(e.to_string()))
    }

    /// Verifies a session token and returns the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let token_data = decode::<Claims>(
            token,
            &self.inner.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AppError::AuthError("unauthorized".to_string()))?;

        token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("unauthorized".to_string()))
    }
}
