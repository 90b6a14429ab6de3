//! User management routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use authgate_auth::{fingerprint, hash_password};
use authgate_db::models::{NewUser, RoleName, UpdateUser};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{CurrentUser, RequireAdmin};
use super::types::{CreateUserRequest, RoleUpdateRequest, UpdateUserRequest, UserResponse};

// ==================== Input Validation ====================

/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Convert an update request into the storage form: the email is
/// fingerprinted and the password is hashed before anything is written
fn prepare_update(request: UpdateUserRequest) -> Result<UpdateUser, ApiError> {
    let mut update = UpdateUser::default();

    if let Some(name) = request.name {
        validate_name(&name)?;
        update.name = Some(name);
    }
    if let Some(email) = request.email {
        validate_email(&email)?;
        update.email = Some(fingerprint(&email));
    }
    if let Some(password) = request.password {
        validate_password(&password)?;
        update.password_hash = Some(hash_password(&password)?);
    }

    Ok(update)
}

// ==================== User Routes ====================

/// POST /users — open registration; new accounts get the reader role
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_email(&request.email)?;
    validate_name(&request.name)?;
    validate_password(&request.password)?;

    debug!("Registering new user");

    let user = state
        .db
        .insert_user(NewUser {
            email: fingerprint(&request.email),
            name: request.name,
            password_hash: hash_password(&request.password)?,
            role: RoleName::Reader,
            is_active: true,
        })
        .await?;

    info!("Created user {}", user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users (admin scope)
async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/me
async fn read_me(current: CurrentUser) -> Json<UserResponse> {
    Json(current.user.into())
}

/// PATCH /users/me
async fn update_me(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let update = prepare_update(request)?;
    state.db.update_user(current.user.id, update).await?;

    let user = state
        .db
        .get_user_by_id(current.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("User {} updated their profile", user.id);
    Ok(Json(user.into()))
}

/// GET /users/{id} — self or admin
async fn get_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    if current.user.id != id && !current.claims.has_scope("admin") {
        return Err(ApiError::Forbidden);
    }

    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// PATCH /users/{id} (admin scope)
async fn update_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // Verify the target exists before applying anything
    state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let update = prepare_update(request)?;
    state.db.update_user(id, update).await?;

    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("Updated user {}", user.id);
    Ok(Json(user.into()))
}

/// PATCH /users/{id}/role (admin scope)
async fn update_user_role(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<RoleUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role = RoleName::from_str(&request.role)
        .map_err(|_| ApiError::NotFound(format!("Unknown role: {}", request.role)))?;

    if !state.db.update_user_role(id, role).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("Changed role of user {} to {}", user.id, role.as_str());
    Ok(Json(user.into()))
}

/// DELETE /users/{id} (admin scope)
///
/// Associated refresh tokens go with the user via the foreign-key
/// cascade.
async fn delete_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_user(id).await? {
        info!("Deleted user {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("User not found".to_string()))
    }
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users", get(list_users))
        .route("/users/me", get(read_me))
        .route("/users/me", patch(update_me))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}", patch(update_user))
        .route("/users/{id}/role", patch(update_user_role))
        .route("/users/{id}", delete(delete_user))
}
