// src/lib.rs

pub mod bootstrap;
pub mod comments;
pub mod config;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod publication;
pub mod queue;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_router;
