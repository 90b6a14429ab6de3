//! Request/Response DTOs

use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Login form (OAuth2 password-grant field names)
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Access/refresh token pair
#[derive(Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Refresh-token record as shown to admins; the stored digest is
/// masked down to a short prefix
#[derive(Serialize, Deserialize)]
pub struct RefreshTokenEntry {
    pub user_id: i64,
    pub token: String,
    pub created_at: String,
    pub expires_at: String,
    pub revoked: bool,
}

// ==================== User Types ====================

/// Registration request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Profile update request; absent fields are left untouched
#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Role change request
#[derive(Deserialize)]
pub struct RoleUpdateRequest {
    pub role: String,
}

/// User response (fingerprinted email, no password hash)
#[derive(Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub role: String,
}

impl From<authgate_db::models::User> for UserResponse {
    fn from(user: authgate_db::models::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            role: user.role.as_str().to_string(),
        }
    }
}
