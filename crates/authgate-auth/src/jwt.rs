//! JWT issuance and validation

use std::collections::HashMap;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AuthError;

/// Token kind carried in the `token_type` claim
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// `sub` carries the fingerprinted email, never the plaintext address.
/// `scopes` is present on access tokens only.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (fingerprinted email)
    pub sub: String,
    /// User role
    pub role: String,
    /// Scopes granted to this token (access tokens only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token kind
    pub token_type: TokenKind,
    /// Unique id, set on rotated refresh tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl TokenClaims {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Role → scopes table, injected into the issuer so new roles don't
/// touch issuance logic. Unknown roles map to no scopes.
#[derive(Debug, Clone)]
pub struct ScopeMap {
    map: HashMap<String, Vec<String>>,
}

impl Default for ScopeMap {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("admin".to_string(), vec!["admin".to_string()]);
        map.insert("reader".to_string(), vec!["reader".to_string()]);
        Self { map }
    }
}

impl ScopeMap {
    pub fn with_role(mut self, role: &str, scopes: &[&str]) -> Self {
        self.map.insert(
            role.to_string(),
            scopes.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn scopes_for(&self, role: &str) -> Vec<String> {
        self.map.get(role).cloned().unwrap_or_default()
    }
}

/// Default token lifetime when the caller does not specify one
const DEFAULT_TTL_MINUTES: i64 = 60;

/// Issues and validates signed tokens.
///
/// Holds the process-wide signing secret; constructed once at startup
/// and shared read-only across requests.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    scope_map: ScopeMap,
}

impl TokenIssuer {
    /// Create a new issuer. An empty secret is a configuration error,
    /// caught at startup rather than on the first request.
    pub fn new(secret: &str, scope_map: ScopeMap) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration(
                "signing secret is not set".to_string(),
            ));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            scope_map,
        })
    }

    /// Issue a signed token.
    ///
    /// Sets `exp = now + ttl` (60 minutes when unspecified). Access
    /// tokens additionally carry the scopes derived from the role
    /// table. Logs the kind and role, never the token itself.
    pub fn issue(
        &self,
        sub: &str,
        role: &str,
        kind: TokenKind,
        ttl: Option<Duration>,
        jti: Option<String>,
    ) -> Result<String, AuthError> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TTL_MINUTES));
        let exp = Utc::now() + ttl;

        let scopes = match kind {
            TokenKind::Access => self.scope_map.scopes_for(role),
            TokenKind::Refresh => Vec::new(),
        };

        let claims = TokenClaims {
            sub: sub.to_string(),
            role: role.to_string(),
            scopes,
            exp: exp.timestamp(),
            token_type: kind,
            jti,
        };

        match kind {
            TokenKind::Access => {
                info!("Issued access token (role: {}), expires at {}", role, exp)
            }
            TokenKind::Refresh => info!("Issued refresh token, expires at {}", exp),
        }

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate a token and parse its claims.
    ///
    /// Two phases, surfaced distinctly: a bad signature or expired
    /// token is an authentication failure, while a validly-signed
    /// payload that doesn't match the claim schema is a client error
    /// (`MalformedClaims`).
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let payload = decode::<serde_json::Value>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        serde_json::from_value(payload.claims)
            .map_err(|e| AuthError::MalformedClaims(e.to_string()))
    }

    /// Enforce that the claims carry every required scope
    pub fn check_scopes(&self, claims: &TokenClaims, required: &[&str]) -> Result<(), AuthError> {
        for scope in required {
            if !claims.has_scope(scope) {
                return Err(AuthError::InsufficientScope);
            }
        }
        Ok(())
    }
}
