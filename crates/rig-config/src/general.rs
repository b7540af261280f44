//! General application configuration.

use rig_core::enums::Role;
use serde::{Deserialize, Serialize};

/// Default result limit.
const fn default_limit() -> u32 {
    20
}

const fn default_role() -> Role {
    Role::Operator
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Optional TOML file replacing the built-in checklist catalog.
    #[serde(default)]
    pub catalog_path: String,

    /// Name of the current user.
    #[serde(default)]
    pub user_name: String,

    /// Badge id of the current user.
    #[serde(default)]
    pub user_badge: String,

    /// Role of the current user.
    #[serde(default = "default_role")]
    pub role: Role,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            catalog_path: String::new(),
            user_name: String::new(),
            user_badge: String::new(),
            role: default_role(),
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.user_name.is_empty() && !self.user_badge.is_empty()
    }

    #[must_use]
    pub fn has_custom_catalog(&self) -> bool {
        !self.catalog_path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.role, Role::Operator);
        assert!(!config.has_identity());
        assert!(!config.has_custom_catalog());
    }
}
