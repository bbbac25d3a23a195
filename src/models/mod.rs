//! Core data models for Havenkey
//!
//! This module contains the data structures that represent the vault
//! domain: vaults, items, categories, settings, and the in-memory
//! backup aggregate.

pub mod bundle;
pub mod category;
pub mod ids;
pub mod item;
pub mod settings;
pub mod vault;

pub use bundle::BackupBundle;
pub use category::Category;
pub use ids::{CategoryId, ItemId, VaultId};
pub use item::{Item, ItemKind, UnknownItemKind};
pub use settings::VaultSettings;
pub use vault::Vault;
