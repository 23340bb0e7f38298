//! Snapshot store configuration.

use serde::{Deserialize, Serialize};

/// Where and how the canonical snapshot and the side lists are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend provider: `"memory"` or `"local"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Root directory for the local provider.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Durable key holding the collections array.
    #[serde(default = "default_state_key")]
    pub state_key: String,
    /// Durable key holding the request history list.
    #[serde(default = "default_history_key")]
    pub history_key: String,
    /// Durable key holding the saved API list.
    #[serde(default = "default_apis_key")]
    pub apis_key: String,
    /// Most history entries kept; older ones are dropped on insert.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            data_root: default_data_root(),
            state_key: default_state_key(),
            history_key: default_history_key(),
            apis_key: default_apis_key(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_state_key() -> String {
    "apiSidebar.collections".to_string()
}

fn default_history_key() -> String {
    "apiSidebar.history".to_string()
}

fn default_apis_key() -> String {
    "apiSidebar.apis".to_string()
}

fn default_history_limit() -> usize {
    100
}
