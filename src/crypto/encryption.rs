//! AES-256-GCM encryption/decryption
//!
//! Provides authenticated encryption for backup payloads. Ciphertexts are
//! carried as a single opaque blob string: base64(nonce || ciphertext),
//! with a fresh 96-bit nonce per encryption operation.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{HavenError, HavenResult};

use super::key_derivation::SymmetricKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Encrypt plaintext into an opaque blob string
pub fn encrypt_blob(plaintext: &[u8], key: &SymmetricKey) -> HavenResult<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| HavenError::Crypto(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| HavenError::Crypto(format!("Encryption failed: {}", e)))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(blob))
}

/// Decrypt an opaque blob string produced by [`encrypt_blob`]
///
/// An authentication-tag failure (wrong key or tampered ciphertext) is
/// reported as `HavenError::Authentication` with no detail, so callers can
/// surface a single "wrong password or corrupt data" message.
pub fn decrypt_blob(blob: &str, key: &SymmetricKey) -> HavenResult<Vec<u8>> {
    let raw = STANDARD
        .decode(blob.trim())
        .map_err(|e| HavenError::Crypto(format!("Invalid blob encoding: {}", e)))?;

    if raw.len() < NONCE_SIZE {
        return Err(HavenError::Crypto(format!(
            "Blob too short: {} bytes",
            raw.len()
        )));
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_SIZE);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| HavenError::Crypto(format!("Failed to create cipher: {}", e)))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| HavenError::Authentication)
}
