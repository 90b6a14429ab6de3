//! Authgate Database Layer
//!
//! This crate provides the database abstraction layer for Authgate,
//! using SQLite via sqlx for persistence. It owns the `users`, `roles`
//! and `refresh_tokens` tables and the refresh-token rotation
//! transaction.

pub mod error;
pub mod models;
pub mod repository;

pub use error::DbError;
pub use models::*;
pub use repository::Database;

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
