//! Key derivation and digests
//!
//! Derives symmetric keys from user secrets (PINs, archive passwords)
//! using Argon2id, a memory-hard key derivation function resistant to
//! GPU/ASIC attacks. SHA-256 provides the digests used for container
//! integrity and PIN verification.

use argon2::{
    password_hash::{rand_core::OsRng, rand_core::RngCore, PasswordHasher, SaltString},
    Argon2, Params,
};
use sha2::{Digest, Sha256};

use crate::error::{HavenError, HavenResult};

/// Memory cost in KiB (64 MiB)
const MEMORY_COST: u32 = 65536;
/// Time cost (iterations)
const TIME_COST: u32 = 3;
/// Parallelism degree
const PARALLELISM: u32 = 4;

/// A 256-bit symmetric key, zeroed on drop
pub struct SymmetricKey {
    key: [u8; 32],
}

impl SymmetricKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Build a key from raw bytes (e.g. an unwrapped data key)
    pub fn from_bytes(bytes: &[u8]) -> HavenResult<Self> {
        if bytes.len() != 32 {
            return Err(HavenError::Crypto(format!(
                "Invalid key length: expected 32, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        // Zero out the key when dropped
        self.key.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey").finish_non_exhaustive()
    }
}

/// Generate a fresh random salt, base64 encoded
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Derive a symmetric key from a secret and a base64 salt
pub fn derive_key(secret: &str, salt: &str) -> HavenResult<SymmetricKey> {
    let salt = SaltString::from_b64(salt)
        .map_err(|e| HavenError::Crypto(format!("Invalid salt: {}", e)))?;

    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(32))
        .map_err(|e| HavenError::Crypto(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| HavenError::Crypto(format!("Key derivation failed: {}", e)))?;

    let hash_output = hash
        .hash
        .ok_or_else(|| HavenError::Crypto("No hash output generated".to_string()))?;

    SymmetricKey::from_bytes(hash_output.as_bytes())
}

/// SHA-256 digest of arbitrary bytes, hex encoded
pub fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key() {
        let salt = generate_salt();
        let key = derive_key("123456", &salt).unwrap();
        assert_eq!(key.as_bytes().len(), 32);
    }

    #[test]
    fn test_same_secret_same_key() {
        let salt = generate_salt();
        let key1 = derive_key("123456", &salt).unwrap();
        let key2 = derive_key("123456", &salt).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_secret_different_key() {
        let salt = generate_salt();
        let key1 = derive_key("123456", &salt).unwrap();
        let key2 = derive_key("654321", &salt).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("123456", &generate_salt()).unwrap();
        let key2 = derive_key("123456", &generate_salt()).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_invalid_salt_rejected() {
        let result = derive_key("123456", "not valid b64!!");
        assert!(matches!(result, Err(HavenError::Crypto(_))));
    }

    #[test]
    fn test_key_from_bytes_length_check() {
        assert!(SymmetricKey::from_bytes(&[0u8; 16]).is_err());
        assert!(SymmetricKey::from_bytes(&[7u8; 32]).is_ok());
    }

    #[test]
    fn test_digest_hex_is_deterministic() {
        let a = digest_hex(b"havenkey");
        let b = digest_hex(b"havenkey");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, digest_hex(b"havenkeys"));
    }
}
