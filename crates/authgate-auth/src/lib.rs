//! Authgate Authentication and Authorization
//!
//! This crate provides credential hashing, email/token fingerprinting,
//! JWT issuance and validation, and the authenticator that checks a
//! credential pair against the user store.

pub mod authenticator;
pub mod error;
pub mod fingerprint;
pub mod jwt;
pub mod password;

pub use authenticator::authenticate_user;
pub use error::AuthError;
pub use fingerprint::{fingerprint, hash_token};
pub use jwt::{ScopeMap, TokenClaims, TokenIssuer, TokenKind};
pub use password::{hash_password, verify_password};
