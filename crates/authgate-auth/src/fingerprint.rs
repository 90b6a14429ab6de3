//! Deterministic one-way hashing for identifying values
//!
//! A fingerprint pseudonymizes a value before storage or lookup: the
//! same input always yields the same 64-char hex digest, so equality
//! queries work without the plaintext ever touching the database. The
//! hash is unkeyed, so this is pseudonymization, not protection against
//! a dictionary attack on low-entropy inputs.

use sha2::{Digest, Sha256};

/// SHA-256 hex fingerprint of an identifying value (e.g. an email)
pub fn fingerprint(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest of an opaque bearer token so the raw token is never stored
pub fn hash_token(raw: &str) -> String {
    fingerprint(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_fixed_length() {
        let a = fingerprint("alice@example.com");
        let b = fingerprint("alice@example.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_inputs_give_distinct_digests() {
        assert_ne!(fingerprint("alice@example.com"), fingerprint("bob@example.com"));
    }

    #[test]
    fn known_vector() {
        assert_eq!(
            fingerprint("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn token_hashing_uses_the_same_primitive() {
        assert_eq!(hash_token("some-raw-token"), fingerprint("some-raw-token"));
    }
}
