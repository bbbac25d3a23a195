//! In-memory item store
//!
//! Backs the CLI (which loads a plain bundle file) and the test suite.
//! Enforces the same referential rules a real store would: an item cannot
//! be created in a vault that does not exist, and duplicate identifiers
//! are rejected.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::{HavenError, HavenResult};
use crate::models::{BackupBundle, Category, Item, Vault, VaultSettings};

use super::{BackupRecord, ItemStore};

#[derive(Debug, Default)]
struct Inner {
    vaults: Vec<Vault>,
    categories: Vec<Category>,
    items: Vec<Item>,
    settings: VaultSettings,
    history: Vec<BackupRecord>,
    locked: bool,
}

/// An in-memory [`ItemStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty, unlocked store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a bundle
    pub fn from_bundle(bundle: BackupBundle) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().expect("store mutex poisoned");
            inner.vaults = bundle.vaults;
            inner.categories = bundle.categories;
            inner.items = bundle.items;
            inner.settings = bundle.settings;
        }
        store
    }

    /// Snapshot the store contents as a bundle
    pub fn to_bundle(&self) -> BackupBundle {
        let inner = self.inner.lock().expect("store mutex poisoned");
        BackupBundle {
            vaults: inner.vaults.clone(),
            categories: inner.categories.clone(),
            items: inner.items.clone(),
            settings: inner.settings.clone(),
        }
    }

    /// Lock the store: subsequent exports fail fast
    pub fn lock(&self) {
        self.inner.lock().expect("store mutex poisoned").locked = true;
    }

    /// The recorded backup history, oldest first
    pub fn backup_history(&self) -> Vec<BackupRecord> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .history
            .clone()
    }
}

impl ItemStore for MemoryStore {
    fn ensure_unlocked(&self) -> HavenResult<()> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        if inner.locked {
            Err(HavenError::MissingKey(
                "no unlocked session: unlock the vault before exporting".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn vaults(&self) -> HavenResult<Vec<Vault>> {
        Ok(self.inner.lock().expect("store mutex poisoned").vaults.clone())
    }

    fn items(&self) -> HavenResult<Vec<Item>> {
        Ok(self.inner.lock().expect("store mutex poisoned").items.clone())
    }

    fn categories(&self) -> HavenResult<Vec<Category>> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .categories
            .clone())
    }

    fn settings(&self) -> HavenResult<VaultSettings> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .settings
            .clone())
    }

    fn create_vault(&self, vault: &Vault) -> HavenResult<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.vaults.iter().any(|v| v.id == vault.id) {
            return Err(HavenError::Store(format!(
                "vault {} already exists",
                vault.id
            )));
        }
        inner.vaults.push(vault.clone());
        Ok(())
    }

    fn create_category(&self, category: &Category) -> HavenResult<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.categories.iter().any(|c| c.id == category.id) {
            return Err(HavenError::Store(format!(
                "category {} already exists",
                category.id
            )));
        }
        inner.categories.push(category.clone());
        Ok(())
    }

    fn create_item(&self, item: &Item) -> HavenResult<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if !inner.vaults.iter().any(|v| v.id == item.vault_id) {
            return Err(HavenError::Store(format!(
                "vault {} does not exist",
                item.vault_id
            )));
        }
        if inner.items.iter().any(|i| i.id == item.id) {
            return Err(HavenError::Store(format!("item {} already exists", item.id)));
        }
        inner.items.push(item.clone());
        Ok(())
    }

    fn record_backup(&self, format: &str, item_count: usize, byte_size: usize) -> HavenResult<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.history.push(BackupRecord {
            format: format.to_string(),
            item_count,
            byte_size,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn last_backup_at(&self) -> HavenResult<Option<DateTime<Utc>>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.history.last().map(|r| r.created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemKind, VaultId};

    #[test]
    fn test_create_and_fetch() {
        let store = MemoryStore::new();
        let vault = Vault::new("Personal");
        store.create_vault(&vault).unwrap();

        let item = Item::new(vault.id, ItemKind::Login);
        store.create_item(&item).unwrap();

        assert_eq!(store.vaults().unwrap().len(), 1);
        assert_eq!(store.items().unwrap().len(), 1);
    }

    #[test]
    fn test_item_requires_existing_vault() {
        let store = MemoryStore::new();
        let orphan = Item::new(VaultId::new(), ItemKind::Login);
        let result = store.create_item(&orphan);
        assert!(matches!(result, Err(HavenError::Store(_))));
    }

    #[test]
    fn test_duplicate_vault_rejected() {
        let store = MemoryStore::new();
        let vault = Vault::new("Personal");
        store.create_vault(&vault).unwrap();
        assert!(store.create_vault(&vault).is_err());
    }

    #[test]
    fn test_locked_store_fails_fast() {
        let store = MemoryStore::new();
        assert!(store.ensure_unlocked().is_ok());
        store.lock();
        let result = store.ensure_unlocked();
        assert!(matches!(result, Err(HavenError::MissingKey(_))));
    }

    #[test]
    fn test_backup_history() {
        let store = MemoryStore::new();
        assert!(store.last_backup_at().unwrap().is_none());

        store.record_backup("hkb", 12, 4096).unwrap();
        store.record_backup("zip", 12, 2048).unwrap();

        let history = store.backup_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].format, "hkb");
        assert!(store.last_backup_at().unwrap().is_some());
    }

    #[test]
    fn test_bundle_roundtrip() {
        let vault = Vault::new("Personal");
        let mut bundle = BackupBundle::default();
        bundle.items.push(Item::new(vault.id, ItemKind::Note));
        bundle.vaults.push(vault);

        let store = MemoryStore::from_bundle(bundle.clone());
        assert_eq!(store.to_bundle(), bundle);
    }
}
