//! Havenkey - Encrypted backup engine for a personal secrets vault
//!
//! This library implements the export, backup, and restore pipeline for a
//! personal vault of credentials and documents. It can emit plain CSV
//! exports, zip archives (optionally password locked), and the encrypted
//! `.hkb` container format, and restore a vault from any of them.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `error`: Custom error types
//! - `models`: Core data models (vaults, items, categories, settings)
//! - `crypto`: Key derivation, authenticated encryption, digests
//! - `store`: The item-store collaborator interface
//! - `export`: CSV, zip archive, and container codecs
//! - `backup`: The orchestrator driving backup and restore runs
//!
//! # Example
//!
//! ```rust,ignore
//! use havenkey::backup::{BackupFormat, BackupOptions, BackupService};
//! use havenkey::crypto::StdCrypto;
//!
//! let service = BackupService::new(&store, &StdCrypto);
//! let options = BackupOptions::new(BackupFormat::Container).with_secret(pin);
//! let bytes = service.create_backup(&options, &mut |_| {})?;
//! ```

pub mod backup;
pub mod crypto;
pub mod error;
pub mod export;
pub mod models;
pub mod store;

pub use error::{HavenError, HavenResult};
