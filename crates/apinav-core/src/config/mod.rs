//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files plus `APINAV__`-prefixed environment variables.
//! Every field carries a default, so an empty configuration is valid.

pub mod logging;
pub mod store;
pub mod sync;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::store::StoreConfig;
pub use self::sync::SyncConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Durable snapshot store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Cross-surface synchronization settings.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default.toml`, an environment-specific overlay
    /// `config/{env}.toml`, and environment variables prefixed with
    /// `APINAV__` (e.g. `APINAV__STORE__PROVIDER=memory`). Missing files
    /// are skipped.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("APINAV")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
