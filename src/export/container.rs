//! The versioned encrypted backup container
//!
//! A container is a single JSON document carrying the four entity payloads
//! (vaults, items, categories, settings) as encrypted blob strings plus the
//! key material needed to open them again. Two layouts exist:
//!
//! - V2 (current, the only write path): a random data key encrypts the
//!   payloads; the data key is wrapped under a key derived from the user's
//!   PIN and a fresh per-container salt. `pinHash` is a digest of the PIN
//!   key so a wrong PIN is rejected without touching any ciphertext.
//! - V1 (legacy, import only): payloads are encrypted directly under the
//!   account master key; the container carries no wrapped key, so opening
//!   one requires an unlocked account.
//!
//! The `integrity` field is a digest over the canonical serialization of
//! every other field. It is verified before any decryption, so a tampered
//! container is rejected with zero decryption attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{decrypt_object, encrypt_object, CryptoProvider, SymmetricKey};
use crate::error::{HavenError, HavenResult};
use crate::models::{BackupBundle, Category, Item, Vault, VaultSettings};

/// Upper bound on a container file, to keep parsing length-bounded
pub const MAX_CONTAINER_BYTES: usize = 64 * 1024 * 1024;

/// The closed set of container layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerVersion {
    V1,
    V2,
}

impl ContainerVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1.0",
            Self::V2 => "2.0",
        }
    }

    pub fn from_tag(tag: &str) -> HavenResult<Self> {
        match tag {
            "1.0" => Ok(Self::V1),
            "2.0" => Ok(Self::V2),
            other => Err(HavenError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// The four encrypted entity payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerData {
    pub vaults: String,
    pub items: String,
    pub categories: String,
    pub settings: String,
}

/// A parsed backup container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Layout tag, "1.0" or "2.0"
    pub version: String,

    /// When the container was written
    pub timestamp: DateTime<Utc>,

    /// Per-container KDF salt, base64
    pub salt: String,

    /// Digest of the PIN-derived key, hex
    pub pin_hash: String,

    /// Data key encrypted under the PIN key (V2 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapped_key: Option<String>,

    /// Encrypted entity payloads
    pub data: ContainerData,

    /// Digest over the canonical serialization of all other fields, hex
    pub integrity: String,
}

impl Container {
    /// The parsed layout version
    pub fn layout(&self) -> HavenResult<ContainerVersion> {
        ContainerVersion::from_tag(&self.version)
    }

    /// Serialize to the on-disk JSON text
    pub fn to_bytes(&self) -> HavenResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse a container from raw bytes.
    ///
    /// Rejects oversized input before parsing, and anything that is not a
    /// JSON document with every required field present.
    pub fn from_slice(bytes: &[u8]) -> HavenResult<Self> {
        if bytes.len() > MAX_CONTAINER_BYTES {
            return Err(HavenError::Parse(format!(
                "Container too large: {} bytes",
                bytes.len()
            )));
        }
        serde_json::from_slice(bytes)
            .map_err(|e| HavenError::Parse(format!("Not a valid backup container: {}", e)))
    }

    /// The canonical serialization the integrity digest is computed over:
    /// every field except `integrity`, in fixed order, newline separated.
    fn canonical(&self) -> String {
        let timestamp = self.timestamp.to_rfc3339();
        [
            self.version.as_str(),
            timestamp.as_str(),
            self.salt.as_str(),
            self.pin_hash.as_str(),
            self.wrapped_key.as_deref().unwrap_or(""),
            self.data.vaults.as_str(),
            self.data.items.as_str(),
            self.data.categories.as_str(),
            self.data.settings.as_str(),
        ]
        .join("\n")
    }

    /// Recompute the integrity digest over the canonical serialization
    pub fn compute_integrity(&self, crypto: &dyn CryptoProvider) -> String {
        crypto.digest(self.canonical().as_bytes())
    }
}

/// Build a V2 container from a bundle and a PIN
pub fn create_container(
    bundle: &BackupBundle,
    pin: &str,
    crypto: &dyn CryptoProvider,
) -> HavenResult<Container> {
    let salt = crypto.generate_salt();
    let pin_key = crypto.derive_key(pin, &salt)?;
    let pin_hash = crypto.digest(pin_key.as_bytes());

    let data_key = crypto.generate_key();
    let data = ContainerData {
        vaults: encrypt_object(crypto, &bundle.vaults, &data_key)?,
        items: encrypt_object(crypto, &bundle.items, &data_key)?,
        categories: encrypt_object(crypto, &bundle.categories, &data_key)?,
        settings: encrypt_object(crypto, &bundle.settings, &data_key)?,
    };
    let wrapped_key = crypto.encrypt(data_key.as_bytes(), &pin_key)?;

    let mut container = Container {
        version: ContainerVersion::V2.as_str().to_string(),
        timestamp: Utc::now(),
        salt,
        pin_hash,
        wrapped_key: Some(wrapped_key),
        data,
        integrity: String::new(),
    };
    container.integrity = container.compute_integrity(crypto);
    Ok(container)
}

/// Open a container and decrypt its payloads back into a bundle.
///
/// Integrity is verified first; a mismatch aborts before any decryption.
/// For V2 the PIN hash is then checked before the wrapped key is touched.
/// V1 containers need the account master key or fail with a missing-key
/// error.
pub fn open_container(
    container: &Container,
    pin: &str,
    account_key: Option<&SymmetricKey>,
    crypto: &dyn CryptoProvider,
) -> HavenResult<BackupBundle> {
    if container.compute_integrity(crypto) != container.integrity {
        return Err(HavenError::Integrity);
    }

    match container.layout()? {
        ContainerVersion::V2 => {
            let pin_key = crypto.derive_key(pin, &container.salt)?;
            if crypto.digest(pin_key.as_bytes()) != container.pin_hash {
                return Err(HavenError::Authentication);
            }
            let wrapped = container.wrapped_key.as_deref().ok_or_else(|| {
                HavenError::Parse("Container is missing its wrapped key".to_string())
            })?;
            let data_key = SymmetricKey::from_bytes(&crypto.decrypt(wrapped, &pin_key)?)?;
            decrypt_payloads(container, &data_key, crypto)
        }
        ContainerVersion::V1 => {
            let key = account_key.ok_or_else(|| {
                HavenError::MissingKey("legacy backup requires account unlock".to_string())
            })?;
            decrypt_payloads(container, key, crypto)
        }
    }
}

/// Check a PIN against a container without decrypting anything.
///
/// V1 containers have no PIN material, so any PIN is reported wrong.
pub fn validate_pin(container: &Container, pin: &str, crypto: &dyn CryptoProvider) -> bool {
    match container.layout() {
        Ok(ContainerVersion::V2) => match crypto.derive_key(pin, &container.salt) {
            Ok(pin_key) => crypto.digest(pin_key.as_bytes()) == container.pin_hash,
            Err(_) => false,
        },
        _ => false,
    }
}

fn decrypt_payloads(
    container: &Container,
    key: &SymmetricKey,
    crypto: &dyn CryptoProvider,
) -> HavenResult<BackupBundle> {
    let vaults: Vec<Vault> = decrypt_object(crypto, &container.data.vaults, key)?;
    let items: Vec<Item> = decrypt_object(crypto, &container.data.items, key)?;
    let categories: Vec<Category> = decrypt_object(crypto, &container.data.categories, key)?;
    let settings: VaultSettings = decrypt_object(crypto, &container.data.settings, key)?;
    Ok(BackupBundle {
        vaults,
        categories,
        items,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::StdCrypto;
    use crate::models::ItemKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to [`StdCrypto`] while counting decryption attempts
    struct CountingCrypto {
        inner: StdCrypto,
        decrypts: AtomicUsize,
    }

    impl CountingCrypto {
        fn new() -> Self {
            Self {
                inner: StdCrypto,
                decrypts: AtomicUsize::new(0),
            }
        }

        fn decrypt_count(&self) -> usize {
            self.decrypts.load(Ordering::SeqCst)
        }
    }

    impl CryptoProvider for CountingCrypto {
        fn encrypt(&self, plaintext: &[u8], key: &SymmetricKey) -> HavenResult<String> {
            self.inner.encrypt(plaintext, key)
        }

        fn decrypt(&self, blob: &str, key: &SymmetricKey) -> HavenResult<Vec<u8>> {
            self.decrypts.fetch_add(1, Ordering::SeqCst);
            self.inner.decrypt(blob, key)
        }

        fn derive_key(&self, secret: &str, salt: &str) -> HavenResult<SymmetricKey> {
            self.inner.derive_key(secret, salt)
        }

        fn generate_key(&self) -> SymmetricKey {
            self.inner.generate_key()
        }

        fn generate_salt(&self) -> String {
            self.inner.generate_salt()
        }

        fn digest(&self, bytes: &[u8]) -> String {
            self.inner.digest(bytes)
        }
    }

    fn sample_bundle() -> BackupBundle {
        let vault = Vault::new("Personal");
        let item = Item::new(vault.id, ItemKind::Login)
            .with_field("name", "GitHub")
            .with_field("username", "kaylee")
            .with_field("password", "hunter2");
        let category = Category::new("Work", "#3498db");
        BackupBundle {
            vaults: vec![vault],
            categories: vec![category],
            items: vec![item],
            settings: VaultSettings::default(),
        }
    }

    /// Build a legacy V1 container directly under an account key
    fn legacy_container(
        bundle: &BackupBundle,
        key: &SymmetricKey,
        crypto: &dyn CryptoProvider,
    ) -> Container {
        let data = ContainerData {
            vaults: encrypt_object(crypto, &bundle.vaults, key).unwrap(),
            items: encrypt_object(crypto, &bundle.items, key).unwrap(),
            categories: encrypt_object(crypto, &bundle.categories, key).unwrap(),
            settings: encrypt_object(crypto, &bundle.settings, key).unwrap(),
        };
        let mut container = Container {
            version: ContainerVersion::V1.as_str().to_string(),
            timestamp: Utc::now(),
            salt: crypto.generate_salt(),
            pin_hash: String::new(),
            wrapped_key: None,
            data,
            integrity: String::new(),
        };
        container.integrity = container.compute_integrity(crypto);
        container
    }

    #[test]
    fn test_container_roundtrip() {
        let crypto = StdCrypto;
        let bundle = sample_bundle();

        let container = create_container(&bundle, "246810", &crypto).unwrap();
        let bytes = container.to_bytes().unwrap();
        let parsed = Container::from_slice(&bytes).unwrap();

        let restored = open_container(&parsed, "246810", None, &crypto).unwrap();
        assert_eq!(restored, bundle);
    }

    #[test]
    fn test_tampered_payload_fails_before_any_decryption() {
        let crypto = CountingCrypto::new();
        let mut container = create_container(&sample_bundle(), "246810", &crypto).unwrap();

        container.data.vaults.push('A');

        let err = open_container(&container, "246810", None, &crypto).unwrap_err();
        assert!(matches!(err, HavenError::Integrity));
        assert_eq!(crypto.decrypt_count(), 0);
    }

    #[test]
    fn test_tampered_integrity_field_is_rejected() {
        let crypto = StdCrypto;
        let mut container = create_container(&sample_bundle(), "246810", &crypto).unwrap();
        container.integrity = crypto.digest(b"forged");
        let err = open_container(&container, "246810", None, &crypto).unwrap_err();
        assert!(matches!(err, HavenError::Integrity));
    }

    #[test]
    fn test_wrong_pin_fails_with_zero_decryptions() {
        let crypto = CountingCrypto::new();
        let container = create_container(&sample_bundle(), "246810", &crypto).unwrap();

        let err = open_container(&container, "000000", None, &crypto).unwrap_err();
        assert!(matches!(err, HavenError::Authentication));
        assert_eq!(crypto.decrypt_count(), 0);
    }

    #[test]
    fn test_validate_pin() {
        let crypto = StdCrypto;
        let container = create_container(&sample_bundle(), "246810", &crypto).unwrap();
        assert!(validate_pin(&container, "246810", &crypto));
        assert!(!validate_pin(&container, "135791", &crypto));
    }

    #[test]
    fn test_legacy_container_needs_account_key() {
        let crypto = StdCrypto;
        let bundle = sample_bundle();
        let account_key = SymmetricKey::generate();
        let container = legacy_container(&bundle, &account_key, &crypto);

        let err = open_container(&container, "246810", None, &crypto).unwrap_err();
        assert!(matches!(err, HavenError::MissingKey(_)));
        assert!(err.to_string().contains("legacy backup requires account unlock"));

        let restored = open_container(&container, "", Some(&account_key), &crypto).unwrap();
        assert_eq!(restored, bundle);

        assert!(!validate_pin(&container, "246810", &crypto));
    }

    #[test]
    fn test_unknown_version_is_unsupported() {
        let crypto = StdCrypto;
        let mut container = create_container(&sample_bundle(), "246810", &crypto).unwrap();
        container.version = "3.0".to_string();
        container.integrity = container.compute_integrity(&crypto);

        let err = open_container(&container, "246810", None, &crypto).unwrap_err();
        assert!(matches!(err, HavenError::UnsupportedVersion(v) if v == "3.0"));
    }

    #[test]
    fn test_missing_fields_are_a_parse_error() {
        let err = Container::from_slice(br#"{"version":"2.0"}"#).unwrap_err();
        assert!(matches!(err, HavenError::Parse(_)));

        let err = Container::from_slice(b"not json at all").unwrap_err();
        assert!(matches!(err, HavenError::Parse(_)));
    }

    #[test]
    fn test_oversized_input_is_rejected_without_parsing() {
        let bytes = vec![b'{'; MAX_CONTAINER_BYTES + 1];
        let err = Container::from_slice(&bytes).unwrap_err();
        assert!(matches!(err, HavenError::Parse(_)));
    }
}
