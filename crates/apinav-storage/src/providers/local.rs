//! Local filesystem state backend.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use apinav_core::error::{AppError, ErrorKind};
use apinav_core::result::AppResult;
use apinav_core::traits::state::StateBackend;

/// Stores each key as `<root>/<key>.json`.
///
/// Writes go to a sibling temporary file that is renamed over the target,
/// so a reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct LocalStateBackend {
    /// Directory holding one file per key.
    root: PathBuf,
}

impl LocalStateBackend {
    /// Create a backend rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create state root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Map a key to its file, replacing path-hostile characters.
    fn resolve(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl StateBackend for LocalStateBackend {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.is_dir())
    }

    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.resolve(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read state file: {}", path.display()),
                e,
            )),
        }
    }

    async fn write(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.resolve(key);
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create temp file: {}", tmp.display()),
                e,
            )
        })?;
        file.write_all(value.as_bytes())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to write state", e))?;
        file.sync_all()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush state", e))?;
        drop(file);

        fs::rename(&tmp, &path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace state file: {}", path.display()),
                e,
            )
        })?;

        debug!(key, bytes = value.len(), "Wrote state file");
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to remove state file: {}", path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = LocalStateBackend::new(dir.path().to_str().unwrap())
            .await
            .expect("backend");
        assert_eq!(backend.read("apiSidebar.collections").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_replaces_whole_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = LocalStateBackend::new(dir.path().to_str().unwrap())
            .await
            .expect("backend");
        backend.write("apiSidebar.collections", "[1,2,3]").await.unwrap();
        backend.write("apiSidebar.collections", "[]").await.unwrap();
        assert_eq!(
            backend.read("apiSidebar.collections").await.unwrap(),
            Some("[]".to_string())
        );
        assert!(dir.path().join("apiSidebar.collections.json").exists());
        assert!(!dir.path().join("apiSidebar.collections.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_key_is_sanitized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = LocalStateBackend::new(dir.path().to_str().unwrap())
            .await
            .expect("backend");
        backend.write("../escape", "x").await.unwrap();
        assert!(dir.path().join(".._escape.json").exists());
    }
}
