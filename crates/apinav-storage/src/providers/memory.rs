//! In-memory state backend.

use async_trait::async_trait;
use dashmap::DashMap;

use apinav_core::result::AppResult;
use apinav_core::traits::state::StateBackend;

/// Process-local backend; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStateBackend {
    values: DashMap<String, String>,
}

impl MemoryStateBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }
}

#[async_trait]
impl StateBackend for MemoryStateBackend {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.get(key).map(|entry| entry.value().clone()))
    }

    async fn write(&self, key: &str, value: &str) -> AppResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_remove() {
        let backend = MemoryStateBackend::new();
        assert_eq!(backend.read("k").await.unwrap(), None);
        backend.write("k", "[1]").await.unwrap();
        assert_eq!(backend.read("k").await.unwrap(), Some("[1]".to_string()));
        backend.remove("k").await.unwrap();
        assert_eq!(backend.read("k").await.unwrap(), None);
    }
}
