//! # rig-config
//!
//! Layered configuration loading for Rigcheck using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`RIGCHECK_*` prefix, `__` as separator)
//! 2. Project-level `.rigcheck/config.toml`
//! 3. User-level `~/.config/rigcheck/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `RIGCHECK_SYNC__DEBOUNCE_MS` -> `sync.debounce_ms`,
//! `RIGCHECK_GENERAL__ROLE` -> `general.role`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use rig_config::RigConfig;
//!
//! let config = RigConfig::load_with_dotenv().expect("config");
//! println!("store: {}", config.store.path);
//! ```

mod error;
mod general;
mod store;
mod sync;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use store::StoreConfig;
pub use sync::SyncConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-level configuration file, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".rigcheck/config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RigConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl RigConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(PROJECT_CONFIG_PATH);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("RIGCHECK_").split("__"))
    }

    /// Reject values the synchronizer cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.debounce_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.sync.backoff_max_ms < self.sync.backoff_base_ms {
            return Err(ConfigError::InvalidValue {
                field: "sync.backoff_max_ms".into(),
                reason: format!(
                    "must be at least backoff_base_ms ({})",
                    self.sync.backoff_base_ms
                ),
            });
        }
        if self.store.change_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.change_buffer".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rigcheck").join("config.toml"))
    }
}
