//! Authentication extractors and routes

use axum::{
    Form, Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
};
use authgate_auth::{AuthError, TokenClaims, TokenKind, authenticate_user, hash_token};
use authgate_db::NewRefreshToken;
use authgate_db::models::User;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginForm, RefreshTokenEntry, TokenPairResponse};

// ==================== Auth Extractors ====================

/// Extract the bearer token from an Authorization header value
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Extractor for validated token claims (signature + expiry + shape)
pub struct AuthClaims(pub TokenClaims);

impl<S> FromRequestParts<S> for AuthClaims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = app_state.issuer.validate(token)?;
        Ok(AuthClaims(claims))
    }
}

/// Extractor for the authorized principal: validated claims plus the
/// resolved user row. A subject that no longer resolves (user deleted
/// after issuance) is an authentication failure.
pub struct CurrentUser {
    pub claims: TokenClaims,
    pub user: User,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;

        let user = app_state
            .db
            .get_user_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        debug!("Authenticated request from user {}", user.id);
        Ok(CurrentUser { claims, user })
    }
}

/// Extractor requiring the `admin` scope
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;

        // Scope check comes before subject resolution
        app_state.issuer.check_scopes(&claims, &["admin"])?;

        let user = app_state
            .db
            .get_user_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(RequireAdmin(CurrentUser { claims, user }))
    }
}

// ==================== Token Pair Minting ====================

/// Mint an access/refresh pair and store the hashed refresh record,
/// revoking prior active records for this (user, app) pair.
async fn mint_token_pair(state: &AppState, user: &User) -> Result<TokenPairResponse, ApiError> {
    let access_token = state.issuer.issue(
        &user.email,
        user.role.as_str(),
        TokenKind::Access,
        Some(state.ttls.access),
        None,
    )?;

    // Every refresh token gets a jti so two pairs minted within the
    // same second still hash to distinct stored digests
    let refresh_token = state.issuer.issue(
        &user.email,
        user.role.as_str(),
        TokenKind::Refresh,
        Some(state.ttls.refresh),
        Some(Uuid::new_v4().to_string()),
    )?;

    state
        .db
        .store_refresh_token(NewRefreshToken {
            user_id: user.id,
            token_hash: hash_token(&refresh_token),
            app_name: state.app_name.clone(),
            expires_at: Utc::now() + state.ttls.refresh,
        })
        .await?;

    Ok(TokenPairResponse {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
    })
}

// ==================== Auth Routes ====================

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    debug!("Login attempt");

    let user = authenticate_user(&state.db, &form.username, &form.password).await?;

    let pair = mint_token_pair(&state, &user).await?;
    info!("User {} logged in", user.id);

    Ok(Json(pair))
}

/// POST /auth/refresh
///
/// Rotation: the presented refresh token is looked up by digest,
/// checked for expiry and revocation, revoked with a compare-and-set,
/// and replaced by a freshly minted pair. Of two rotations racing on
/// the same token, exactly one wins the compare-and-set; the other is
/// rejected like any revoked token.
async fn refresh(State(state): State<AppState>, parts: Parts) -> Result<Json<TokenPairResponse>, ApiError> {
    let raw_token = bearer_token(&parts)?;
    let claims = state.issuer.validate(raw_token)?;

    if claims.token_type != TokenKind::Refresh {
        debug!("Refresh attempted with a non-refresh token");
        return Err(AuthError::InvalidToken.into());
    }

    let record = state
        .db
        .find_refresh_token(&hash_token(raw_token))
        .await?
        .ok_or_else(|| {
            warn!("Presented refresh token has no stored record");
            AuthError::InvalidToken
        })?;

    // Expiry is enforced here, not in the store
    if record.is_expired(Utc::now()) {
        debug!("Refresh token for user {} is expired", record.user_id);
        return Err(AuthError::TokenExpired.into());
    }

    if record.revoked {
        warn!("Revoked refresh token presented for user {}", record.user_id);
        return Err(AuthError::InvalidToken.into());
    }

    // Compare-and-set: a concurrent rotation of the same token fails here
    if !state.db.revoke_refresh_token(record.id).await? {
        warn!("Lost rotation race for user {}", record.user_id);
        return Err(AuthError::InvalidToken.into());
    }

    // The subject is already the fingerprinted email
    let user = state
        .db
        .get_user_by_email(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let pair = mint_token_pair(&state, &user).await?;
    info!("Rotated refresh token for user {}", user.id);

    Ok(Json(pair))
}

/// GET /auth/refresh-tokens (admin scope)
async fn list_refresh_tokens(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<RefreshTokenEntry>>, ApiError> {
    let tokens = state.db.list_refresh_tokens().await?;

    Ok(Json(
        tokens
            .into_iter()
            .map(|t| RefreshTokenEntry {
                user_id: t.user_id,
                token: format!("{}...", &t.token_hash[..10]),
                created_at: t.created_at.to_rfc3339(),
                expires_at: t.expires_at.to_rfc3339(),
                revoked: t.revoked,
            })
            .collect(),
    ))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/refresh-tokens", get(list_refresh_tokens))
}
