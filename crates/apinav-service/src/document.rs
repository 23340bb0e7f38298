//! Load → edit → save with conflict retry for the side-list stores.

use tracing::warn;

use apinav_core::config::SyncConfig;
use apinav_core::error::ErrorKind;
use apinav_core::result::AppResult;
use apinav_storage::{SnapshotVersion, StoredDocument, Versioned, VersionedStore};

/// How saves treat a concurrent writer.
#[derive(Debug, Clone, Copy)]
pub struct SavePolicy {
    /// Reject stale saves and retry; otherwise overwrite.
    pub optimistic_concurrency: bool,
    /// Retries after a conflict before the error is returned.
    pub max_conflict_retries: u32,
}

impl From<&SyncConfig> for SavePolicy {
    fn from(sync: &SyncConfig) -> Self {
        Self {
            optimistic_concurrency: sync.optimistic_concurrency,
            max_conflict_retries: sync.max_conflict_retries,
        }
    }
}

/// Outcome of [`update_document`].
#[derive(Debug, Clone)]
pub struct DocumentUpdate<T, R> {
    /// The document after the edit.
    pub value: T,
    /// Version of `value`; unchanged when nothing was saved.
    pub version: SnapshotVersion,
    /// What the edit returned.
    pub result: R,
}

/// Run `edit` against the stored document and save it if the edit
/// reports a change.
///
/// `edit` returns `(changed, result)`. It may run more than once when a
/// save loses a race, always against a freshly loaded document.
pub async fn update_document<T, R, F>(
    store: &VersionedStore<T>,
    policy: SavePolicy,
    op: &'static str,
    mut edit: F,
) -> AppResult<DocumentUpdate<T, R>>
where
    T: StoredDocument,
    F: FnMut(&mut T) -> AppResult<(bool, R)>,
{
    let mut retries = 0;
    loop {
        let Versioned { mut value, version } = store.load().await?;
        let (changed, result) = edit(&mut value)?;
        if !changed {
            return Ok(DocumentUpdate {
                value,
                version,
                result,
            });
        }

        let saved = if policy.optimistic_concurrency {
            store.save(&value, version).await
        } else {
            store.overwrite(&value).await
        };
        match saved {
            Ok(version) => {
                return Ok(DocumentUpdate {
                    value,
                    version,
                    result,
                });
            }
            Err(e) if e.is(ErrorKind::Conflict) && retries < policy.max_conflict_retries => {
                retries += 1;
                warn!(op, key = store.key(), retries, "Stored list changed underneath, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}
