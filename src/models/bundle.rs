//! The in-memory backup aggregate
//!
//! A `BackupBundle` exists only for the duration of one export or import
//! operation; it is what the orchestrator hands to the codecs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::item::{Item, ItemKind};
use super::settings::VaultSettings;
use super::vault::Vault;

/// Everything that goes into (or comes out of) one backup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupBundle {
    /// All vaults
    #[serde(default)]
    pub vaults: Vec<Vault>,

    /// All categories
    #[serde(default)]
    pub categories: Vec<Category>,

    /// All items, across all vaults
    #[serde(default)]
    pub items: Vec<Item>,

    /// User settings
    #[serde(default)]
    pub settings: VaultSettings,
}

impl BackupBundle {
    /// Total number of items in the bundle
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// True if the bundle carries no entities at all
    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty() && self.categories.is_empty() && self.items.is_empty()
    }

    /// Partition items by kind, in the fixed kind order, skipping empty
    /// partitions
    pub fn items_by_kind(&self) -> Vec<(ItemKind, Vec<&Item>)> {
        let mut partitions: BTreeMap<ItemKind, Vec<&Item>> = BTreeMap::new();
        for item in &self.items {
            partitions.entry(item.kind).or_default().push(item);
        }
        ItemKind::all()
            .iter()
            .filter_map(|kind| partitions.remove(kind).map(|items| (*kind, items)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VaultId;

    #[test]
    fn test_empty_bundle() {
        let bundle = BackupBundle::default();
        assert!(bundle.is_empty());
        assert_eq!(bundle.item_count(), 0);
        assert!(bundle.items_by_kind().is_empty());
    }

    #[test]
    fn test_items_by_kind_skips_empty_partitions() {
        let vault = Vault::new("Personal");
        let mut bundle = BackupBundle::default();
        bundle.vaults.push(vault.clone());
        bundle.items.push(Item::new(vault.id, ItemKind::Login));
        bundle.items.push(Item::new(vault.id, ItemKind::Login));
        bundle.items.push(Item::new(vault.id, ItemKind::Note));

        let partitions = bundle.items_by_kind();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].0, ItemKind::Login);
        assert_eq!(partitions[0].1.len(), 2);
        assert_eq!(partitions[1].0, ItemKind::Note);
    }

    #[test]
    fn test_bundle_serialization() {
        let mut bundle = BackupBundle::default();
        bundle.items.push(Item::new(VaultId::new(), ItemKind::Wifi));
        let json = serde_json::to_string(&bundle).unwrap();
        let deserialized: BackupBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(bundle, deserialized);
    }
}
