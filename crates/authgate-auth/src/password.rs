//! Credential hashing
//!
//! Argon2id with a fresh random salt per call: hashing the same
//! password twice yields different PHC strings, and verification reads
//! the parameters back out of the stored digest.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::AuthError;

/// A valid Argon2 hash that no password verifies against. Used to keep
/// the login path at one verification regardless of whether the user
/// exists.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Hash a plaintext password
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a plaintext password against a stored digest.
///
/// A digest that is not a well-formed PHC string is an error, not a
/// silent mismatch: it means the stored record is corrupt.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(digest).map_err(|e| AuthError::InvalidDigestFormat(e.to_string()))?;

    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let digest = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &digest).unwrap());
        assert!(!verify_password("battery staple", &digest).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_is_an_error() {
        let result = verify_password("secret", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::InvalidDigestFormat(_))));
    }

    #[test]
    fn dummy_hash_never_verifies() {
        assert!(!verify_password("admin", DUMMY_HASH).unwrap());
        assert!(!verify_password("", DUMMY_HASH).unwrap());
    }
}
