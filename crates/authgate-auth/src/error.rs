//! Authentication error types
//!
//! Credential failures are distinguished internally (`UserNotFound` vs
//! `InvalidPassword`) but collapse to one external message so callers
//! cannot enumerate accounts.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Insufficient permissions")]
    InsufficientScope,

    #[error("Malformed token claims: {0}")]
    MalformedClaims(String),

    #[error("Stored digest is not a valid hash: {0}")]
    InvalidDigestFormat(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(#[from] authgate_db::DbError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // One message for both so failures don't reveal which field was wrong
            AuthError::UserNotFound | AuthError::InvalidPassword => {
                (StatusCode::UNAUTHORIZED, "Incorrect email or password")
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::MissingAuthHeader => {
                (StatusCode::UNAUTHORIZED, "Missing authorization header")
            }
            AuthError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format",
            ),
            AuthError::InsufficientScope => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            AuthError::MalformedClaims(_) => {
                (StatusCode::BAD_REQUEST, "Malformed token claims")
            }
            AuthError::InvalidDigestFormat(_)
            | AuthError::PasswordHash(_)
            | AuthError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
            AuthError::Jwt(_) => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
