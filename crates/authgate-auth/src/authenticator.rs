//! Credential verification against the user store

use authgate_db::Database;
use authgate_db::models::User;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::fingerprint::fingerprint;
use crate::password::{DUMMY_HASH, verify_password};

/// Authenticate a user by login email and plaintext password.
///
/// The email is fingerprinted before lookup, so the store only ever
/// sees the digest. Failures are typed (`UserNotFound` vs
/// `InvalidPassword`) for internal logging; both render as the same
/// external 401. When the user is absent we still verify against a
/// dummy digest so both paths cost one argon2 verification.
pub async fn authenticate_user(
    db: &Database,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let fingerprinted = fingerprint(email);

    let user = db.get_user_by_email(&fingerprinted).await?;

    let (digest, user) = match user {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let password_valid = verify_password(password, &digest)?;

    match (user, password_valid) {
        (Some(user), true) => {
            info!("User {} successfully authenticated", user.id);
            Ok(user)
        }
        (Some(user), false) => {
            debug!("Invalid password for user {}", user.id);
            Err(AuthError::InvalidPassword)
        }
        (None, _) => {
            debug!("Login attempt for unknown email");
            Err(AuthError::UserNotFound)
        }
    }
}
