//! State backend implementations.

#[cfg(feature = "local")]
pub mod local;
pub mod memory;

use std::sync::Arc;

use tracing::info;

use apinav_core::config::StoreConfig;
use apinav_core::error::AppError;
use apinav_core::result::AppResult;
use apinav_core::traits::state::StateBackend;

#[cfg(feature = "local")]
pub use local::LocalStateBackend;
pub use memory::MemoryStateBackend;

/// Build the backend selected by `config.provider`.
pub async fn build_backend(config: &StoreConfig) -> AppResult<Arc<dyn StateBackend>> {
    let backend: Arc<dyn StateBackend> = match config.provider.as_str() {
        "memory" => Arc::new(MemoryStateBackend::new()),
        #[cfg(feature = "local")]
        "local" => Arc::new(LocalStateBackend::new(&config.data_root).await?),
        other => {
            return Err(AppError::configuration(format!(
                "Unknown store provider '{other}'"
            )));
        }
    };

    info!(provider = backend.provider_type(), "State backend initialized");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let config = StoreConfig {
            provider: "s3".to_string(),
            ..Default::default()
        };
        let err = build_backend(&config).await.expect_err("should fail");
        assert_eq!(err.kind, apinav_core::error::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_memory_provider() {
        let config = StoreConfig {
            provider: "memory".to_string(),
            ..Default::default()
        };
        let backend = build_backend(&config).await.expect("build");
        assert_eq!(backend.provider_type(), "memory");
    }
}
