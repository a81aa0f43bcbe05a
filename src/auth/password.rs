//! Password hashing
//!
//! Salted, iterated SHA-256 digests stored as
//! `sha256$<iterations>$<salt_hex>$<digest_hex>`. The iteration count is
//! embedded per hash so it can be raised later without invalidating
//! existing accounts.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Iterations for new hashes
const HASH_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = digest_iterated(password.as_bytes(), &salt, HASH_ITERATIONS);
    format!(
        "sha256${}${}${}",
        HASH_ITERATIONS,
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Check a password against a stored hash string
///
/// Returns false on any malformed input; a corrupt column must never
/// let a login through.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (scheme, iterations, salt_hex, digest_hex) = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some(s), Some(i), Some(salt), Some(digest), None) => (s, i, salt, digest),
        _ => return false,
    };
    if scheme != "sha256" {
        return false;
    }
    let iterations: u32 = match iterations.parse() {
        Ok(n) if n > 0 => n,
        _ => return false,
    };
    let salt = match hex::decode(salt_hex) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let expected = match hex::decode(digest_hex) {
        Ok(d) => d,
        Err(_) => return false,
    };

    let computed = digest_iterated(password.as_bytes(), &salt, iterations);
    constant_time_eq(&computed, &expected)
}

/// salt || password, then re-digest `iterations - 1` times
fn digest_iterated(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password);
    let mut digest: [u8; 32] = hasher.finalize().into();
    for _ in 1..iterations {
        digest = Sha256::digest(digest).into();
    }
    digest
}

/// Comparison that does not short-circuit on the first mismatching byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("student123");
        assert!(verify_password("student123", &hash));
        assert!(!verify_password("student124", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same");
        let b = hash_password("same");
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn test_rejects_malformed_stored_hash() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "sha256$0$aa$bb"));
        assert!(!verify_password("x", "sha256$abc$aa$bb"));
        assert!(!verify_password("x", "md5$1000$aa$bb"));
        assert!(!verify_password("x", "sha256$1000$nothex$bb"));
        assert!(!verify_password("x", "sha256$1$aa$bb$extra"));
    }

    #[test]
    fn test_format_shape() {
        let hash = hash_password("pw");
        let parts: Vec<&str> = hash.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "sha256");
        assert_eq!(parts[2].len(), SALT_LEN * 2);
        assert_eq!(parts[3].len(), 64);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
