//! Password key hashing (GNTP/1.0 "Message Authorization").

use super::hex_upper;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;

/// Salted SHA-256 key hash sent on the information line.
///
/// `key = SHA256(password || salt)` and the hash sent is `SHA256(key)`.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyHash {
    key_hash: String,
    salt: String,
}

impl KeyHash {
    /// Hashes `password` with a fresh 16-byte random salt.
    #[must_use]
    pub fn generate(password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill(&mut salt);
        Self::with_salt(password, &salt)
    }

    /// Hashes `password` with the given salt.
    #[must_use]
    pub fn with_salt(password: &str, salt: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(salt);
        let key = hasher.finalize();

        Self {
            key_hash: hex_upper(&Sha256::digest(key)),
            salt: hex_upper(salt),
        }
    }

    /// Returns the hex key hash.
    #[must_use]
    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    /// Returns the hex salt.
    #[must_use]
    pub fn salt(&self) -> &str {
        &self.salt
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256:{}.{}", self.key_hash, self.salt)
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHash")
            .field("algorithm", &"SHA256")
            .field("salt", &self.salt)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_known_key_hash() {
        let salt: Vec<u8> = (0u8..16).collect();
        let hash = KeyHash::with_salt("secret", &salt);
        assert_eq!(
            hash.key_hash(),
            "DD78B72BBCE584A1301F4AA906E8746FF4757F43F6D3A63807D69B92FE577DC3"
        );
        assert_eq!(hash.salt(), "000102030405060708090A0B0C0D0E0F");
        assert_eq!(
            hash.to_string(),
            concat!(
                "SHA256:DD78B72BBCE584A1301F4AA906E8746FF4757F43F6D3A63807D69B92FE577DC3",
                ".000102030405060708090A0B0C0D0E0F",
            )
        );
    }

    #[test]
    fn test_generate_uses_fresh_salt() {
        let a = KeyHash::generate("secret");
        let b = KeyHash::generate("secret");
        assert_eq!(a.salt().len(), 32);
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.key_hash(), b.key_hash());
    }
}
