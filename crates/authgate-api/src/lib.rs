//! Authgate REST API
//!
//! This crate provides the Axum-based HTTP surface for Authgate:
//! login/refresh endpoints, refresh-token inspection, and user CRUD.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, TokenTtls};
