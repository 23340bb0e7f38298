//! The saved API list.

use std::sync::Arc;

use apinav_core::error::AppError;
use apinav_core::result::AppResult;
use apinav_entity::ApiEntry;
use apinav_entity::history::default_api_version;
use apinav_storage::ApiStore;

use crate::document::{SavePolicy, update_document};

/// Named APIs, most recently added first.
#[derive(Debug, Clone)]
pub struct ApiCatalogService {
    store: Arc<ApiStore>,
    policy: SavePolicy,
}

impl ApiCatalogService {
    /// Creates a new catalog service.
    pub fn new(store: Arc<ApiStore>, policy: SavePolicy) -> Self {
        Self { store, policy }
    }

    /// Every saved API.
    pub async fn list(&self) -> AppResult<Vec<ApiEntry>> {
        Ok(self.store.load().await?.value)
    }

    /// Add an API at the front. A missing or blank version becomes `v1.0`.
    pub async fn add(&self, name: &str, version: Option<&str>) -> AppResult<ApiEntry> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::malformed_intent("API name must not be empty"));
        }
        let entry = ApiEntry {
            name: name.to_string(),
            version: version
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map_or_else(default_api_version, str::to_string),
        };
        update_document(self.store.as_ref(), self.policy, "addApi", |apis| {
            apis.insert(0, entry.clone());
            Ok((true, ()))
        })
        .await?;
        Ok(entry)
    }

    /// Remove every API. Returns how many were removed.
    pub async fn clear(&self) -> AppResult<usize> {
        let update = update_document(self.store.as_ref(), self.policy, "clearApis", |apis| {
            let removed = apis.len();
            apis.clear();
            Ok((removed > 0, removed))
        })
        .await?;
        Ok(update.result)
    }
}
