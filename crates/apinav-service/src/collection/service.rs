//! The load → mutate → save loop over the canonical snapshot.

use std::sync::Arc;

use tracing::{debug, info, warn};

use apinav_core::config::SyncConfig;
use apinav_core::error::{AppError, ErrorKind};
use apinav_core::result::AppResult;
use apinav_core::types::id::{CollectionId, RequestId};
use apinav_entity::{FocusContext, FolderPath, RequestRecord, Snapshot};
use apinav_storage::{CollectionStore, SnapshotVersion, Versioned};

use crate::tree::{PathResolver, TreeMutator};

use super::mutation::Mutation;

/// Result of a mutation that went through [`CollectionService::apply`].
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// The snapshot after the mutation.
    pub snapshot: Snapshot,
    /// Version of `snapshot`; unchanged when nothing was saved.
    pub version: SnapshotVersion,
    /// Where surfaces should focus.
    pub focus: FocusContext,
    /// Whether anything was saved.
    pub changed: bool,
    /// Id of the node the mutation created, if any.
    pub created: Option<String>,
    /// How many version conflicts were retried.
    pub retries: u32,
}

/// Runs each [`Mutation`] as one load → mutate → save cycle.
///
/// With optimistic concurrency on, a save that lost a race is reloaded and
/// reapplied up to `max_conflict_retries` times. With it off, saves
/// overwrite whatever is stored and a concurrent mutation can be lost.
#[derive(Debug, Clone)]
pub struct CollectionService {
    store: Arc<CollectionStore>,
    mutator: TreeMutator,
    optimistic_concurrency: bool,
    max_conflict_retries: u32,
}

impl CollectionService {
    /// Creates a new collection service.
    pub fn new(store: Arc<CollectionStore>, mutator: TreeMutator, sync: &SyncConfig) -> Self {
        Self {
            store,
            mutator,
            optimistic_concurrency: sync.optimistic_concurrency,
            max_conflict_retries: sync.max_conflict_retries,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<CollectionStore> {
        &self.store
    }

    /// Load the current snapshot.
    pub async fn snapshot(&self) -> AppResult<Versioned<Snapshot>> {
        self.store.load().await
    }

    /// Apply `mutation` and persist the result.
    ///
    /// Lookup and validation failures are returned without saving. Storage
    /// failures propagate unchanged.
    pub async fn apply(&self, mutation: Mutation) -> AppResult<MutationOutcome> {
        let mut retries = 0;
        loop {
            let Versioned { value: mut snapshot, version } = self.store.load().await?;
            let effect = self.mutator.apply(&mut snapshot, &mutation)?;

            if !effect.changed {
                debug!(op = mutation.op_name(), "Mutation left snapshot unchanged, not saving");
                return Ok(MutationOutcome {
                    snapshot,
                    version,
                    focus: effect.focus,
                    changed: false,
                    created: effect.created,
                    retries,
                });
            }

            let saved = if self.optimistic_concurrency {
                self.store.save(&snapshot, version).await
            } else {
                self.store.overwrite(&snapshot).await
            };

            match saved {
                Ok(version) => {
                    info!(
                        op = mutation.op_name(),
                        collection_id = ?mutation.collection_id(),
                        version = %version,
                        retries,
                        "Mutation saved"
                    );
                    return Ok(MutationOutcome {
                        snapshot,
                        version,
                        focus: effect.focus,
                        changed: true,
                        created: effect.created,
                        retries,
                    });
                }
                Err(e) if e.is(ErrorKind::Conflict) && retries < self.max_conflict_retries => {
                    retries += 1;
                    warn!(op = mutation.op_name(), retries, "Snapshot changed underneath, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Pretty-printed JSON of one collection.
    pub async fn export_collection(&self, collection_id: &CollectionId) -> AppResult<String> {
        let snapshot = self.store.load().await?.value;
        TreeMutator::export_collection(&snapshot, collection_id)
    }

    /// Look up a request and the path of its container.
    pub async fn find_request(
        &self,
        collection_id: &CollectionId,
        request_id: &RequestId,
    ) -> AppResult<(RequestRecord, FolderPath)> {
        let snapshot = self.store.load().await?.value;
        let collection = snapshot
            .collection(collection_id)
            .ok_or_else(|| AppError::not_found(format!("Collection {collection_id} not found")))?;
        let path = PathResolver::find_path_for_request(collection, request_id)
            .ok_or_else(|| AppError::not_found(format!("Request {request_id} not found")))?;
        let request = PathResolver::find_request(collection, &path, request_id)?.clone();
        Ok((request, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use apinav_core::traits::state::StateBackend;
    use apinav_core::types::generator::UuidGenerator;
    use apinav_storage::providers::MemoryStateBackend;

    /// Delays reads so two concurrent mutations both load before either saves.
    #[derive(Debug, Default)]
    struct SlowReads {
        inner: MemoryStateBackend,
    }

    #[async_trait]
    impl StateBackend for SlowReads {
        fn provider_type(&self) -> &str {
            "slow"
        }

        async fn health_check(&self) -> AppResult<bool> {
            Ok(true)
        }

        async fn read(&self, key: &str) -> AppResult<Option<String>> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, value: &str) -> AppResult<()> {
            self.inner.write(key, value).await
        }

        async fn remove(&self, key: &str) -> AppResult<()> {
            self.inner.remove(key).await
        }
    }

    fn service(backend: Arc<dyn StateBackend>, optimistic: bool) -> CollectionService {
        let store = Arc::new(CollectionStore::new(backend, "apiSidebar.collections"));
        let sync = SyncConfig {
            optimistic_concurrency: optimistic,
            ..Default::default()
        };
        CollectionService::new(store, TreeMutator::new(Arc::new(UuidGenerator)), &sync)
    }

    fn add(name: &str) -> Mutation {
        Mutation::AddCollection {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_apply_persists() {
        let service = service(Arc::new(MemoryStateBackend::new()), true);
        let outcome = service.apply(add("Demo")).await.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.version, SnapshotVersion::new(1));
        let loaded = service.snapshot().await.unwrap();
        assert_eq!(loaded.value, outcome.snapshot);
    }

    #[tokio::test]
    async fn test_not_found_does_not_save() {
        let service = service(Arc::new(MemoryStateBackend::new()), true);
        let err = service
            .apply(Mutation::DeleteCollection {
                collection_id: CollectionId::new("nope"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(service.store().current_version().await, SnapshotVersion::INITIAL);
    }

    #[tokio::test]
    async fn test_unchanged_rename_does_not_save() {
        let service = service(Arc::new(MemoryStateBackend::new()), true);
        let outcome = service.apply(add("Demo")).await.unwrap();
        let id = CollectionId::new(outcome.created.unwrap());
        let outcome = service
            .apply(Mutation::RenameCollection {
                collection_id: id,
                name: "Demo".to_string(),
            })
            .await
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.version, SnapshotVersion::new(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_is_retried() {
        let service = service(Arc::new(SlowReads::default()), true);
        let (a, b) = tokio::join!(service.apply(add("A")), service.apply(add("B")));
        let retries = a.unwrap().retries + b.unwrap().retries;
        assert_eq!(retries, 1);
        assert_eq!(service.snapshot().await.unwrap().value.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_writer_wins_without_concurrency_control() {
        let service = service(Arc::new(SlowReads::default()), false);
        let (a, b) = tokio::join!(service.apply(add("A")), service.apply(add("B")));
        a.unwrap();
        b.unwrap();
        assert_eq!(service.snapshot().await.unwrap().value.len(), 1);
    }

    #[tokio::test]
    async fn test_find_request() {
        let service = service(Arc::new(MemoryStateBackend::new()), true);
        let id = CollectionId::new(service.apply(add("Demo")).await.unwrap().created.unwrap());
        let folder = service
            .apply(Mutation::AddFolder {
                collection_id: id.clone(),
                path: FolderPath::root(),
                name: "F".to_string(),
            })
            .await
            .unwrap();
        let path = FolderPath::root().child(folder.created.unwrap().into());
        let request = service
            .apply(Mutation::AddRequest {
                collection_id: id.clone(),
                path: path.clone(),
                draft: Default::default(),
            })
            .await
            .unwrap();
        let request_id = RequestId::new(request.created.unwrap());

        let (found, at) = service.find_request(&id, &request_id).await.unwrap();
        assert_eq!(found.id, request_id);
        assert_eq!(at, path);
    }
}
