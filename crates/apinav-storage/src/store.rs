//! Versioned document stores: the collections snapshot, the request
//! history, and the saved API list.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use apinav_core::error::{AppError, ErrorKind};
use apinav_core::result::AppResult;
use apinav_core::traits::state::StateBackend;
use apinav_entity::{ApiEntry, HistoryEntry, Snapshot};

/// Monotonic token identifying one observed state of a stored document.
///
/// Starts at `0` for a freshly opened store and increases by one per save,
/// and once more whenever the stored value is found changed by another
/// writer. The token lives in memory only; the persisted value stays a
/// bare array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotVersion(u64);

impl SnapshotVersion {
    /// The version of a store that has not been saved since it was opened.
    pub const INITIAL: Self = Self(0);

    /// Wrap a raw version number.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw number.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The version following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A value paired with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// The loaded value.
    pub value: T,
    /// Version the value was read at.
    pub version: SnapshotVersion,
}

/// A value persisted whole under one durable key.
pub trait StoredDocument: Serialize + DeserializeOwned + Default + Send + Sync {
    /// What the stored JSON must be, for error messages.
    const DESCRIPTION: &'static str;

    /// Item count, for logging.
    fn item_count(&self) -> usize;
}

impl StoredDocument for Snapshot {
    const DESCRIPTION: &'static str = "a collections array";

    fn item_count(&self) -> usize {
        self.len()
    }
}

impl StoredDocument for Vec<HistoryEntry> {
    const DESCRIPTION: &'static str = "a history array";

    fn item_count(&self) -> usize {
        self.len()
    }
}

impl StoredDocument for Vec<ApiEntry> {
    const DESCRIPTION: &'static str = "an API array";

    fn item_count(&self) -> usize {
        self.len()
    }
}

/// SHA-256 of the raw stored text; an unset key hashes like an empty one.
type Fingerprint = [u8; 32];

fn fingerprint(raw: Option<&str>) -> Fingerprint {
    let digest = Sha256::digest(raw.unwrap_or_default().as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

#[derive(Debug, Default)]
struct StoreState {
    version: SnapshotVersion,
    /// Content last read or written by this store; `None` until first contact.
    seen: Option<Fingerprint>,
}

/// Reads and writes one document under one durable key.
///
/// Every save replaces the whole value. [`VersionedStore::save`] refuses
/// to write when the caller's version is stale, including when another
/// process sharing the backend has written since this store last looked;
/// [`VersionedStore::overwrite`] writes unconditionally.
#[derive(Debug)]
pub struct VersionedStore<T> {
    backend: Arc<dyn StateBackend>,
    key: String,
    state: Mutex<StoreState>,
    _document: PhantomData<fn() -> T>,
}

/// The canonical collections snapshot.
pub type CollectionStore = VersionedStore<Snapshot>;
/// The request history list.
pub type HistoryStore = VersionedStore<Vec<HistoryEntry>>;
/// The saved API list.
pub type ApiStore = VersionedStore<Vec<ApiEntry>>;

impl<T: StoredDocument> VersionedStore<T> {
    /// Open a store over `backend` at `key`.
    pub fn new(backend: Arc<dyn StateBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            state: Mutex::new(StoreState::default()),
            _document: PhantomData,
        }
    }

    /// The durable key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The backend provider name.
    pub fn provider_type(&self) -> &str {
        self.backend.provider_type()
    }

    /// The version of the last save or observed outside write.
    pub async fn current_version(&self) -> SnapshotVersion {
        self.state.lock().await.version
    }

    /// Load the document.
    ///
    /// An unset or blank value loads as the empty document.
    pub async fn load(&self) -> AppResult<Versioned<T>> {
        let mut state = self.state.lock().await;
        let raw = self.backend.read(&self.key).await?;
        self.observe(&mut state, raw.as_deref());
        let value = self.decode(raw.as_deref())?;
        Ok(Versioned {
            value,
            version: state.version,
        })
    }

    /// Persist `value` if nobody has saved since `expected` was read.
    ///
    /// Returns the new version. A stale `expected` yields
    /// [`ErrorKind::Conflict`] and nothing is written.
    pub async fn save(&self, value: &T, expected: SnapshotVersion) -> AppResult<SnapshotVersion> {
        let mut state = self.state.lock().await;
        let raw = self.backend.read(&self.key).await?;
        self.observe(&mut state, raw.as_deref());
        if state.version != expected {
            warn!(
                key = %self.key,
                expected = %expected,
                current = %state.version,
                "Rejected stale save"
            );
            return Err(AppError::conflict(format!(
                "Stored value changed since {expected} (now {})",
                state.version
            )));
        }
        self.write(&mut state, value).await
    }

    /// Persist `value` regardless of what was saved in between.
    pub async fn overwrite(&self, value: &T) -> AppResult<SnapshotVersion> {
        let mut state = self.state.lock().await;
        self.write(&mut state, value).await
    }

    /// Compare `raw` with what this store last saw; a difference means
    /// another writer got in and counts as a new version.
    fn observe(&self, state: &mut StoreState, raw: Option<&str>) {
        let current = fingerprint(raw);
        if state.seen.is_some_and(|seen| seen != current) {
            state.version = state.version.next();
            info!(key = %self.key, version = %state.version, "Stored value changed by another writer");
        }
        state.seen = Some(current);
    }

    fn decode(&self, raw: Option<&str>) -> AppResult<T> {
        let Some(raw) = raw else {
            debug!(key = %self.key, "Nothing stored, starting empty");
            return Ok(T::default());
        };
        if raw.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(raw).map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Stored value under '{}' is not {}", self.key, T::DESCRIPTION),
                e,
            )
        })
    }

    async fn write(&self, state: &mut StoreState, value: &T) -> AppResult<SnapshotVersion> {
        let raw = serde_json::to_string(value).map_err(|e| {
            AppError::with_source(ErrorKind::Serialization, "Failed to encode stored value", e)
        })?;
        self.backend.write(&self.key, &raw).await?;
        state.version = state.version.next();
        state.seen = Some(fingerprint(Some(&raw)));
        debug!(key = %self.key, items = value.item_count(), version = %state.version, "Saved");
        Ok(state.version)
    }
}
