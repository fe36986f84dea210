//! Password hashing and bearer token issuance.
//!
//! Credentials are salted SHA-256 digests stored as `salt$digest` in
//! base64. Tokens are opaque random strings; the store keeps no token
//! state, so callers treat them as bearer secrets for the session layer.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plaintext: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, plaintext);
    format!("{}${}", STANDARD.encode(salt), STANDARD.encode(digest))
}

/// Verify a plaintext password against a stored `salt$digest` credential.
/// Malformed credentials verify as false rather than erroring.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt_b64), STANDARD.decode(digest_b64)) else {
        return false;
    };
    salted_digest(&salt, plaintext).as_slice() == expected.as_slice()
}

fn salted_digest(salt: &[u8], plaintext: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(plaintext.as_bytes());
    hasher.finalize().to_vec()
}

/// Issue an opaque bearer token for an authenticated username.
pub fn issue_token(username: &str) -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    // Prefix with the username so operators can attribute tokens in logs.
    format!("{}.{}", username, URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn malformed_credential_never_verifies() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", "!!$!!"));
    }

    #[test]
    fn tokens_are_unique_and_attributed() {
        let a = issue_token("alice");
        let b = issue_token("alice");
        assert_ne!(a, b);
        assert!(a.starts_with("alice."));
    }
}
