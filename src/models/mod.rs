// src/models/mod.rs

pub mod blog;
pub mod comment;
pub mod email;
pub mod topic;
pub mod user;
