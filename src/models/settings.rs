//! User settings carried inside a backup
//!
//! The backup engine treats settings as opaque serializable data: they are
//! encrypted into the container's fourth payload blob and handed back to
//! the store on restore.

use serde::{Deserialize, Serialize};

use super::ids::VaultId;

/// Flat set of user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSettings {
    /// UI theme name
    #[serde(default = "default_theme")]
    pub theme: String,

    /// UI language tag
    #[serde(default = "default_language")]
    pub language: String,

    /// Minutes of inactivity before the vault locks itself
    #[serde(default = "default_auto_lock")]
    pub auto_lock_minutes: u32,

    /// Seconds before copied secrets are cleared from the clipboard
    #[serde(default = "default_clipboard_clear")]
    pub clipboard_clear_seconds: u32,

    /// Vault opened by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_vault: Option<VaultId>,
}

fn default_theme() -> String {
    "system".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_auto_lock() -> u32 {
    5
}

fn default_clipboard_clear() -> u32 {
    30
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            language: default_language(),
            auto_lock_minutes: default_auto_lock(),
            clipboard_clear_seconds: default_clipboard_clear(),
            default_vault: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = VaultSettings::default();
        assert_eq!(settings.theme, "system");
        assert_eq!(settings.auto_lock_minutes, 5);
    }

    #[test]
    fn test_partial_deserialization() {
        let settings: VaultSettings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.language, "en");
    }
}
