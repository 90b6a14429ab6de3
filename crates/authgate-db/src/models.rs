//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRole(s) => write!(f, "Invalid role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role, mapped to token scopes at issuance time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Admin,
    Reader,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::Reader => "reader",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, RoleName::Admin)
    }

    /// All roles created at bootstrap
    pub const ALL: [RoleName; 2] = [RoleName::Admin, RoleName::Reader];
}

impl FromStr for RoleName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(RoleName::Admin),
            "reader" => Ok(RoleName::Reader),
            _ => Err(ParseError::InvalidRole(s.to_string())),
        }
    }
}

/// User model
///
/// `email` holds the SHA-256 fingerprint of the login email, never the
/// plaintext value. Equality lookups still work because the fingerprint
/// is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub role: RoleName,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Fingerprinted email
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: RoleName,
    pub is_active: bool,
}

/// Partial user update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// Fingerprinted email
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// Refresh-token record
///
/// `token_hash` is the SHA-256 hex digest of the raw token; the raw
/// token is never persisted. Rows are retained after revocation for
/// inspection; garbage collection happens outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub app_name: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshToken {
    /// Expiry is enforced by the caller, not by the store
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// New refresh-token record (for insertion)
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: i64,
    pub token_hash: String,
    pub app_name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Parse an RFC 3339 timestamp stored as text, falling back to now
pub(crate) fn parse_datetime_or_now(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            password_hash: row.try_get("password_hash")?,
            is_active: row.try_get("is_active")?,
            role: RoleName::from_str(&role_str).unwrap_or(RoleName::Reader),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for RefreshToken {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(RefreshToken {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token_hash: row.try_get("token_hash")?,
            app_name: row.try_get("app_name")?,
            expires_at: parse_datetime_or_now(&row.try_get::<String, _>("expires_at")?),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            revoked: row.try_get("revoked")?,
        })
    }
}
