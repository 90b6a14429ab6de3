//! Application state

use authgate_auth::TokenIssuer;
use authgate_db::Database;
use chrono::Duration;
use std::sync::Arc;

/// Token lifetimes used by the login and refresh flows
#[derive(Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(7),
        }
    }
}

/// Application state shared across handlers.
///
/// Everything here is read-only after startup; all mutation goes
/// through the database.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub issuer: Arc<TokenIssuer>,
    pub ttls: TokenTtls,
    /// Client identifier attached to stored refresh tokens, scoping the
    /// one-active-token-per-principal invariant
    pub app_name: Option<String>,
}

impl AppState {
    pub fn new(
        db: Database,
        issuer: Arc<TokenIssuer>,
        ttls: TokenTtls,
        app_name: Option<String>,
    ) -> Self {
        Self {
            db,
            issuer,
            ttls,
            app_name,
        }
    }
}
