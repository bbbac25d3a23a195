//! Vault model
//!
//! A vault is a named collection of items. Vaults are held plaintext in
//! memory during a backup operation; at-rest encryption is the item store's
//! concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::VaultId;

/// A vault grouping related items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    /// Unique identifier
    pub id: VaultId,

    /// Display name
    pub name: String,

    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Icon tag for UI rendering
    #[serde(default)]
    pub icon: String,

    /// Whether this vault is shared with other users
    #[serde(default)]
    pub shared: bool,

    /// Optional notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the vault was created
    pub created_at: DateTime<Utc>,
}

impl Vault {
    /// Create a new vault
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: VaultId::new(),
            name: name.into(),
            description: None,
            icon: String::new(),
            shared: false,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new vault with an icon tag
    pub fn with_icon(name: impl Into<String>, icon: impl Into<String>) -> Self {
        let mut vault = Self::new(name);
        vault.icon = icon.into();
        vault
    }
}

impl fmt::Display for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
