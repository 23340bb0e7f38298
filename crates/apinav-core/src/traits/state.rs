//! Durable state port for whole-value reads and writes.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for durable key/value backends.
///
/// A backend stores opaque string values under string keys and never
/// interprets them. Writes replace the whole value; there is no partial
/// or delta update. The [`StateBackend`] trait is defined here in
/// `apinav-core` and implemented in `apinav-storage`.
#[async_trait]
pub trait StateBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "memory", "local").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is usable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read the value stored under `key`, or `None` if it was never written.
    async fn read(&self, key: &str) -> AppResult<Option<String>>;

    /// Replace the value stored under `key`.
    async fn write(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> AppResult<()>;
}
