//! Entity store: every read and write against Postgres goes through here.
//!
//! Multi-step mutations run inside a single transaction; an early return
//! drops the `Transaction` and sqlx rolls it back.

pub mod associations;
pub mod blogs;
pub mod comments;
pub mod topics;
pub mod users;

/// True when the error is a Postgres unique-constraint violation (23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// True when the error is a Postgres foreign-key violation (23503).
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_foreign_key_violation())
        .unwrap_or(false)
}
