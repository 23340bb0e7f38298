//! Request history: newest first, capped, grouped by day.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::info;

use apinav_core::error::AppError;
use apinav_core::result::AppResult;
use apinav_core::types::generator::IdGenerator;
use apinav_core::types::id::HistoryId;
use apinav_entity::{HistoryEntry, HistoryGroup, group_by_day};
use apinav_storage::HistoryStore;

use crate::document::{SavePolicy, update_document};

/// Records sent requests under the history key.
#[derive(Debug, Clone)]
pub struct HistoryService {
    store: Arc<HistoryStore>,
    ids: Arc<dyn IdGenerator>,
    limit: usize,
    policy: SavePolicy,
}

impl HistoryService {
    /// Creates a new history service keeping at most `limit` entries.
    pub fn new(
        store: Arc<HistoryStore>,
        ids: Arc<dyn IdGenerator>,
        limit: usize,
        policy: SavePolicy,
    ) -> Self {
        Self {
            store,
            ids,
            limit,
            policy,
        }
    }

    /// Every entry, newest first.
    pub async fn list(&self) -> AppResult<Vec<HistoryEntry>> {
        Ok(self.store.load().await?.value)
    }

    /// Entries grouped by day label relative to `now`.
    pub async fn groups<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AppResult<Vec<HistoryGroup>> {
        Ok(group_by_day(&self.list().await?, now))
    }

    /// Put `entry` at the front, dropping the oldest entries beyond the
    /// limit. An entry with a blank id is given a fresh one.
    pub async fn add(&self, mut entry: HistoryEntry) -> AppResult<HistoryEntry> {
        if entry.id.as_str().trim().is_empty() {
            entry.id = HistoryId::new(self.ids.generate());
        }
        let limit = self.limit;
        let update = update_document(self.store.as_ref(), self.policy, "addHistory", |entries| {
            entries.insert(0, entry.clone());
            entries.truncate(limit);
            Ok((true, ()))
        })
        .await?;
        info!(history_id = %entry.id, entries = update.value.len(), "History entry added");
        Ok(entry)
    }

    /// Copy an entry to the front with a fresh id stamped at `now`.
    pub async fn duplicate(&self, id: &HistoryId, now: DateTime<Utc>) -> AppResult<HistoryEntry> {
        let source = self
            .list()
            .await?
            .into_iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| history_not_found(id))?;
        let copy = HistoryEntry {
            id: HistoryId::new(self.ids.generate()),
            timestamp: Some(now),
            ..source
        };
        self.add(copy).await
    }

    /// Remove one entry.
    pub async fn delete(&self, id: &HistoryId) -> AppResult<()> {
        update_document(self.store.as_ref(), self.policy, "deleteHistoryItem", |entries| {
            let before = entries.len();
            entries.retain(|e| &e.id != id);
            if entries.len() == before {
                return Err(history_not_found(id));
            }
            Ok((true, ()))
        })
        .await?;
        Ok(())
    }

    /// Remove every entry. Returns how many were removed.
    pub async fn clear(&self) -> AppResult<usize> {
        let update = update_document(self.store.as_ref(), self.policy, "clearHistory", |entries| {
            let removed = entries.len();
            entries.clear();
            Ok((removed > 0, removed))
        })
        .await?;
        Ok(update.result)
    }

    /// Remove every entry whose day label relative to `now` is `label`.
    /// Returns how many were removed.
    pub async fn clear_group<Tz: TimeZone>(&self, label: &str, now: &DateTime<Tz>) -> AppResult<usize> {
        let update = update_document(self.store.as_ref(), self.policy, "clearHistoryGroup", |entries| {
            let before = entries.len();
            entries.retain(|e| e.day_label(now) != label);
            let removed = before - entries.len();
            Ok((removed > 0, removed))
        })
        .await?;
        Ok(update.result)
    }
}

fn history_not_found(id: &HistoryId) -> AppError {
    AppError::not_found(format!("History entry {id} not found"))
}
