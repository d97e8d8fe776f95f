// src/handlers/mod.rs

pub mod auth;
pub mod blog;
pub mod comment;
pub mod topic;
