//! Custom error types for Havenkey
//!
//! This module defines the error hierarchy for the backup engine using
//! thiserror for ergonomic error definitions. The fatal conditions of the
//! backup pipeline (tampering, wrong PIN, unknown container version,
//! missing key material) are distinct variants so callers can pattern-match
//! them without string inspection.

use thiserror::Error;

/// The main error type for Havenkey operations
#[derive(Error, Debug)]
pub enum HavenError {
    /// Container integrity digest mismatch; the file was tampered with or
    /// truncated. Raised before any decryption is attempted.
    #[error("Integrity check failed: the backup has been modified or corrupted")]
    Integrity,

    /// Wrong PIN or archive password (manifests as a key-verification or
    /// authentication-tag failure)
    #[error("Authentication failed: wrong PIN/password or corrupt data")]
    Authentication,

    /// Container version tag not recognized
    #[error("Unsupported backup version: {0}")]
    UnsupportedVersion(String),

    /// Required key material is absent (locked session, or a legacy
    /// container restored without the account master key)
    #[error("Missing key: {0}")]
    MissingKey(String),

    /// Malformed input scoped to a single file or archive entry
    #[error("Parse error: {0}")]
    Parse(String),

    /// Cryptographic primitive failure (cipher setup, key derivation)
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Archive (zip) read/write errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Item-store collaborator errors
    #[error("Store error: {0}")]
    Store(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl HavenError {
    /// Check if this is an integrity failure
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity)
    }

    /// Check if this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Check if this is a missing-key failure
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey(_))
    }

    /// Check if this error is fatal for a whole backup/restore operation
    /// (as opposed to scoped to a single file or entity)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for HavenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HavenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for HavenError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

/// Result type alias for Havenkey operations
pub type HavenResult<T> = Result<T, HavenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HavenError::UnsupportedVersion("3.0".into());
        assert_eq!(err.to_string(), "Unsupported backup version: 3.0");
    }

    #[test]
    fn test_predicates() {
        assert!(HavenError::Integrity.is_integrity());
        assert!(HavenError::Authentication.is_authentication());
        assert!(HavenError::MissingKey("account key".into()).is_missing_key());
        assert!(!HavenError::Parse("bad csv".into()).is_fatal());
        assert!(HavenError::Integrity.is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let haven_err: HavenError = io_err.into();
        assert!(matches!(haven_err, HavenError::Io(_)));
    }
}
