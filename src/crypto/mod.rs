//! Cryptographic functions for Havenkey
//!
//! Provides AES-256-GCM encryption with Argon2id key derivation, SHA-256
//! digests, and the `CryptoProvider` capability trait the backup engine
//! consumes.

pub mod encryption;
pub mod key_derivation;
pub mod provider;
pub mod secure_memory;

pub use encryption::{decrypt_blob, encrypt_blob};
pub use key_derivation::{derive_key, digest_hex, generate_salt, SymmetricKey};
pub use provider::{decrypt_object, encrypt_object, CryptoProvider, StdCrypto};
pub use secure_memory::SecureString;
