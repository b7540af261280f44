//! Record store configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".rigcheck/rigcheck.db".to_string()
}

/// Default capacity of the row-change broadcast channel.
const fn default_change_buffer() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Number of change notifications buffered per subscriber before it lags.
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            change_buffer: default_change_buffer(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}
