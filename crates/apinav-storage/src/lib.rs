//! # apinav-storage
//!
//! Durable state backends and the [`VersionedStore`] documents on top of
//! them. [`CollectionStore`] is the only component that reads or writes the
//! persisted collections snapshot; [`HistoryStore`] and [`ApiStore`] hold
//! the side lists under their own keys.

pub mod providers;
pub mod store;

pub use providers::build_backend;
pub use store::{
    ApiStore, CollectionStore, HistoryStore, SnapshotVersion, StoredDocument, Versioned,
    VersionedStore,
};
