//! # apinav-entity
//!
//! Data model for the collections tree. A [`Snapshot`] is the ordered list
//! of [`Collection`] trees; each collection and every nested [`Folder`]
//! share the same shape (sub-folders plus request records) through the
//! [`TreeContainer`] trait, so tree walks never special-case the root.
//! The request history and the saved API list live beside the tree under
//! their own keys.

pub mod collection;
pub mod history;
pub mod snapshot;

pub use collection::{
    AuthDescriptor, Collection, Encoded, EncodedForm, Folder, FolderPath, RequestPatch,
    RequestRecord, TreeContainer,
};
pub use history::{ApiEntry, HistoryEntry, HistoryGroup, group_by_day};
pub use snapshot::{FocusContext, Snapshot};
