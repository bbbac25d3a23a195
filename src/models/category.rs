//! Category model
//!
//! Categories label items across vaults for filtering and display.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CategoryId;

/// A user-defined item category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Category name
    pub name: String,

    /// Color tag for UI rendering (e.g. "#ff8800" or a named color)
    #[serde(default)]
    pub color: String,
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            color: color.into(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
