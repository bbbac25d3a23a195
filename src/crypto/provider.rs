//! The crypto capability consumed by the codecs and the orchestrator
//!
//! Crypto primitives are passed in as an explicit collaborator rather than
//! reached through globals, so tests can substitute instrumented
//! implementations (e.g. to assert that a tampered container is never
//! decrypted).

use crate::error::HavenResult;

use super::encryption;
use super::key_derivation::{self, SymmetricKey};

/// Cryptographic primitives with a fixed contract
pub trait CryptoProvider {
    /// Authenticated encryption of bytes into an opaque blob string
    fn encrypt(&self, plaintext: &[u8], key: &SymmetricKey) -> HavenResult<String>;

    /// Inverse of [`CryptoProvider::encrypt`]
    fn decrypt(&self, blob: &str, key: &SymmetricKey) -> HavenResult<Vec<u8>>;

    /// Derive a key from a secret and a base64 salt
    fn derive_key(&self, secret: &str, salt: &str) -> HavenResult<SymmetricKey>;

    /// Generate a fresh random key
    fn generate_key(&self) -> SymmetricKey;

    /// Generate a fresh random salt
    fn generate_salt(&self) -> String;

    /// Cryptographic digest, hex encoded
    fn digest(&self, bytes: &[u8]) -> String;
}

/// The production implementation: Argon2id + AES-256-GCM + SHA-256
#[derive(Debug, Default, Clone, Copy)]
pub struct StdCrypto;

impl CryptoProvider for StdCrypto {
    fn encrypt(&self, plaintext: &[u8], key: &SymmetricKey) -> HavenResult<String> {
        encryption::encrypt_blob(plaintext, key)
    }

    fn decrypt(&self, blob: &str, key: &SymmetricKey) -> HavenResult<Vec<u8>> {
        encryption::decrypt_blob(blob, key)
    }

    fn derive_key(&self, secret: &str, salt: &str) -> HavenResult<SymmetricKey> {
        key_derivation::derive_key(secret, salt)
    }

    fn generate_key(&self) -> SymmetricKey {
        SymmetricKey::generate()
    }

    fn generate_salt(&self) -> String {
        key_derivation::generate_salt()
    }

    fn digest(&self, bytes: &[u8]) -> String {
        key_derivation::digest_hex(bytes)
    }
}

/// Encrypt a serializable value through a provider
pub fn encrypt_object<T: serde::Serialize>(
    crypto: &dyn CryptoProvider,
    value: &T,
    key: &SymmetricKey,
) -> HavenResult<String> {
    let json = serde_json::to_vec(value)?;
    crypto.encrypt(&json, key)
}

/// Decrypt a blob into a deserializable value through a provider
pub fn decrypt_object<T: serde::de::DeserializeOwned>(
    crypto: &dyn CryptoProvider,
    blob: &str,
    key: &SymmetricKey,
) -> HavenResult<T> {
    let plaintext = crypto.decrypt(blob, key)?;
    serde_json::from_slice(&plaintext).map_err(|e| {
        crate::error::HavenError::Parse(format!("Decrypted payload is not valid JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_crypto_roundtrip() {
        let crypto = StdCrypto;
        let key = crypto.generate_key();
        let blob = crypto.encrypt(b"payload", &key).unwrap();
        assert_eq!(crypto.decrypt(&blob, &key).unwrap(), b"payload");
    }

    #[test]
    fn test_object_helpers() {
        let crypto = StdCrypto;
        let key = crypto.generate_key();
        let blob = encrypt_object(&crypto, &vec![1u32, 2, 3], &key).unwrap();
        let value: Vec<u32> = decrypt_object(&crypto, &blob, &key).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn test_digest_matches_free_function() {
        let crypto = StdCrypto;
        assert_eq!(
            crypto.digest(b"x"),
            crate::crypto::key_derivation::digest_hex(b"x")
        );
    }
}
