//! The item-store collaborator interface
//!
//! The persistent store (with its own at-rest encryption and CRUD surface)
//! is external to the backup engine. The orchestrator only consumes this
//! trait: fetch everything, create entities one at a time during restore,
//! and record backup metadata.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HavenResult;
use crate::models::{Category, Item, Vault, VaultSettings};

/// A backup-history record kept by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Backup format tag ("hkb", "zip", "zip+password", "csv")
    pub format: String,
    /// Number of items included
    pub item_count: usize,
    /// Size of the produced artifact in bytes
    pub byte_size: usize,
    /// When the backup completed
    pub created_at: DateTime<Utc>,
}

/// Access to the user's persistent vault data
pub trait ItemStore {
    /// Fail fast when no unlocked session is available. Export must not
    /// read any data before this check passes.
    fn ensure_unlocked(&self) -> HavenResult<()>;

    /// Fetch all vaults
    fn vaults(&self) -> HavenResult<Vec<Vault>>;

    /// Fetch all items across vaults
    fn items(&self) -> HavenResult<Vec<Item>>;

    /// Fetch all categories
    fn categories(&self) -> HavenResult<Vec<Category>>;

    /// Fetch user settings
    fn settings(&self) -> HavenResult<VaultSettings>;

    /// Create a vault during restore
    fn create_vault(&self, vault: &Vault) -> HavenResult<()>;

    /// Create a category during restore
    fn create_category(&self, category: &Category) -> HavenResult<()>;

    /// Create an item during restore
    fn create_item(&self, item: &Item) -> HavenResult<()>;

    /// Record a completed backup (also updates the last-backup timestamp)
    fn record_backup(&self, format: &str, item_count: usize, byte_size: usize) -> HavenResult<()>;

    /// Timestamp of the most recent recorded backup
    fn last_backup_at(&self) -> HavenResult<Option<DateTime<Utc>>>;
}

pub use memory::MemoryStore;
