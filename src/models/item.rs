//! Item model and the closed set of item kinds
//!
//! An item's attribute bag is shaped entirely by its kind: each kind owns a
//! fixed list of valid field keys, and the codecs use that list to decide
//! which CSV columns populate which fields. Anything outside the list is
//! dropped on decode.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ItemId, VaultId};

/// The closed set of item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Login,
    Card,
    Identity,
    Note,
    Wifi,
    Bank,
    License,
    Database,
    Server,
    SshKey,
    IdCard,
    File,
}

impl ItemKind {
    /// All kinds, in the order they appear in exports
    pub fn all() -> &'static [Self] {
        &[
            Self::Login,
            Self::Card,
            Self::Identity,
            Self::Note,
            Self::Wifi,
            Self::Bank,
            Self::License,
            Self::Database,
            Self::Server,
            Self::SshKey,
            Self::IdCard,
            Self::File,
        ]
    }

    /// The lowercase tag used in serialized data and archive file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Card => "card",
            Self::Identity => "identity",
            Self::Note => "note",
            Self::Wifi => "wifi",
            Self::Bank => "bank",
            Self::License => "license",
            Self::Database => "database",
            Self::Server => "server",
            Self::SshKey => "ssh-key",
            Self::IdCard => "id-card",
            Self::File => "file",
        }
    }

    /// Parse a lowercase tag back into a kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == tag)
    }

    /// Kind-specific CSV columns as (column header, bag field key) pairs.
    ///
    /// The card kind's `expiry` field is not listed here: the CSV codec
    /// splits it into separate `Expiry Month` / `Expiry Year` columns.
    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Login => &[
                ("Name", "name"),
                ("Username", "username"),
                ("Password", "password"),
                ("URL", "url"),
                ("TOTP Secret", "totp"),
                ("Notes", "notes"),
            ],
            Self::Card => &[
                ("Name", "name"),
                ("Cardholder Name", "cardholder_name"),
                ("Card Number", "card_number"),
                ("CVV", "cvv"),
                ("PIN", "pin"),
                ("Notes", "notes"),
            ],
            Self::Identity => &[
                ("Name", "name"),
                ("First Name", "first_name"),
                ("Last Name", "last_name"),
                ("Email", "email"),
                ("Phone", "phone"),
                ("Address", "address"),
                ("Passport Number", "passport_number"),
                ("Notes", "notes"),
            ],
            Self::Note => &[("Name", "name"), ("Notes", "notes")],
            Self::Wifi => &[
                ("Name", "name"),
                ("SSID", "ssid"),
                ("Password", "password"),
                ("Security", "security"),
                ("Notes", "notes"),
            ],
            Self::Bank => &[
                ("Name", "name"),
                ("Bank Name", "bank_name"),
                ("Account Number", "account_number"),
                ("Routing Number", "routing_number"),
                ("IBAN", "iban"),
                ("SWIFT", "swift"),
                ("Notes", "notes"),
            ],
            Self::License => &[
                ("Name", "name"),
                ("License Key", "license_key"),
                ("Licensed To", "licensed_to"),
                ("Email", "email"),
                ("Version", "version"),
                ("Expires", "expires"),
                ("Notes", "notes"),
            ],
            Self::Database => &[
                ("Name", "name"),
                ("Host", "host"),
                ("Port", "port"),
                ("Database", "database"),
                ("Username", "username"),
                ("Password", "password"),
                ("Notes", "notes"),
            ],
            Self::Server => &[
                ("Name", "name"),
                ("Host", "host"),
                ("Username", "username"),
                ("Password", "password"),
                ("URL", "url"),
                ("Notes", "notes"),
            ],
            Self::SshKey => &[
                ("Name", "name"),
                ("Host", "host"),
                ("Username", "username"),
                ("Private Key", "private_key"),
                ("Public Key", "public_key"),
                ("Passphrase", "passphrase"),
                ("Notes", "notes"),
            ],
            Self::IdCard => &[
                ("Name", "name"),
                ("ID Number", "id_number"),
                ("Issued", "issued"),
                ("Expires", "expires"),
                ("Country", "country"),
                ("Notes", "notes"),
            ],
            Self::File => &[
                ("Name", "name"),
                ("File Name", "file_name"),
                ("Mime Type", "mime_type"),
                ("Size", "size"),
                ("Notes", "notes"),
            ],
        }
    }

    /// The bag field keys valid for this kind
    pub fn valid_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = self.columns().iter().map(|(_, f)| *f).collect();
        if *self == Self::Card {
            fields.push("expiry");
        }
        fields
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string is not a recognized item kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownItemKind(pub String);

impl fmt::Display for UnknownItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown item kind: {}", self.0)
    }
}

impl std::error::Error for UnknownItemKind {}

impl FromStr for ItemKind {
    type Err = UnknownItemKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownItemKind(s.to_string()))
    }
}

/// A single vault item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,

    /// The vault this item belongs to
    pub vault_id: VaultId,

    /// Item type, determining the shape of the attribute bag
    pub kind: ItemKind,

    /// Kind-dependent attributes, keyed by canonical field name
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Favorite flag
    #[serde(default)]
    pub favorite: bool,

    /// Optional category reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,

    /// When the item was created
    pub created_at: DateTime<Utc>,

    /// When the item was last modified
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new item with an empty attribute bag
    pub fn new(vault_id: VaultId, kind: ItemKind) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            vault_id,
            kind,
            fields: BTreeMap::new(),
            favorite: false,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get a field value, empty-string default
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// Set a field value (builder style)
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Drop any bag field that is not valid for this item's kind
    pub fn retain_valid_fields(&mut self) {
        let valid = self.kind.valid_fields();
        self.fields.retain(|key, _| valid.contains(&key.as_str()));
    }

    /// Human-readable label used in restore error reports
    pub fn describe(&self) -> String {
        let name = self.field("name");
        if name.is_empty() {
            format!("{} item {}", self.kind, self.id)
        } else {
            format!("{} '{}'", self.kind, name)
        }
    }
}
