//! Typed mutation intents.

use apinav_core::types::id::{CollectionId, FolderId, RequestId};
use apinav_entity::{FolderPath, RequestPatch};

/// One structural change to the collections tree.
///
/// Request- and folder-addressed variants take an optional `path`. When
/// present it must resolve to the container holding the target; when
/// absent the target is located by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert a new empty collection at the front.
    AddCollection {
        /// Collection name.
        name: String,
    },
    /// Rename a collection.
    RenameCollection {
        /// Target collection.
        collection_id: CollectionId,
        /// New name.
        name: String,
    },
    /// Remove a collection and everything in it.
    DeleteCollection {
        /// Target collection.
        collection_id: CollectionId,
    },
    /// Deep-copy a collection next to the original.
    DuplicateCollection {
        /// Target collection.
        collection_id: CollectionId,
    },
    /// Remove every collection.
    ClearCollections,
    /// Insert a new empty folder at the front of a container.
    AddFolder {
        /// Owning collection.
        collection_id: CollectionId,
        /// Container to insert into; the root when empty.
        path: FolderPath,
        /// Folder name.
        name: String,
    },
    /// Rename a folder.
    RenameFolder {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target folder.
        folder_id: FolderId,
        /// Container holding the folder.
        path: Option<FolderPath>,
        /// New name.
        name: String,
    },
    /// Remove a folder and its subtree.
    DeleteFolder {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target folder.
        folder_id: FolderId,
        /// Container holding the folder.
        path: Option<FolderPath>,
    },
    /// Deep-copy a folder next to the original.
    DuplicateFolder {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target folder.
        folder_id: FolderId,
        /// Container holding the folder.
        path: Option<FolderPath>,
    },
    /// Insert a new request at the front of a container.
    AddRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Container to insert into; the root when empty.
        path: FolderPath,
        /// Initial field values.
        draft: RequestPatch,
    },
    /// Shallow-merge fields into a request.
    UpdateRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target request.
        request_id: RequestId,
        /// Container holding the request.
        path: Option<FolderPath>,
        /// Fields to replace.
        patch: RequestPatch,
    },
    /// Rename a request.
    RenameRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target request.
        request_id: RequestId,
        /// Container holding the request.
        path: Option<FolderPath>,
        /// New name.
        name: String,
    },
    /// Remove a request.
    DeleteRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target request.
        request_id: RequestId,
        /// Container holding the request.
        path: Option<FolderPath>,
    },
    /// Copy a request next to the original.
    DuplicateRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target request.
        request_id: RequestId,
        /// Container holding the request.
        path: Option<FolderPath>,
    },
    /// Set the canonical hidden flag of a request.
    SetRequestHidden {
        /// Owning collection.
        collection_id: CollectionId,
        /// Target request.
        request_id: RequestId,
        /// Container holding the request.
        path: Option<FolderPath>,
        /// New flag value.
        hidden: bool,
    },
    /// Save a request under a chain of folder names, creating missing
    /// folders on the way.
    SaveRequestAtNames {
        /// Owning collection.
        collection_id: CollectionId,
        /// Folder names from the root downward.
        folder_names: Vec<String>,
        /// Initial field values.
        draft: RequestPatch,
    },
}

impl Mutation {
    /// Wire name of the operation.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::AddCollection { .. } => "addCollection",
            Self::RenameCollection { .. } => "renameCollection",
            Self::DeleteCollection { .. } => "deleteCollection",
            Self::DuplicateCollection { .. } => "duplicateCollection",
            Self::ClearCollections => "clearCollections",
            Self::AddFolder { .. } => "addFolder",
            Self::RenameFolder { .. } => "renameFolder",
            Self::DeleteFolder { .. } => "deleteFolder",
            Self::DuplicateFolder { .. } => "duplicateFolder",
            Self::AddRequest { .. } => "addRequest",
            Self::UpdateRequest { .. } => "updateRequest",
            Self::RenameRequest { .. } => "renameRequest",
            Self::DeleteRequest { .. } => "deleteRequest",
            Self::DuplicateRequest { .. } => "duplicateRequest",
            Self::SetRequestHidden { .. } => "setRequestHidden",
            Self::SaveRequestAtNames { .. } => "saveRequestAtNames",
        }
    }

    /// The collection this mutation targets, if any.
    pub fn collection_id(&self) -> Option<&CollectionId> {
        match self {
            Self::AddCollection { .. } | Self::ClearCollections => None,
            Self::RenameCollection { collection_id, .. }
            | Self::DeleteCollection { collection_id }
            | Self::DuplicateCollection { collection_id }
            | Self::AddFolder { collection_id, .. }
            | Self::RenameFolder { collection_id, .. }
            | Self::DeleteFolder { collection_id, .. }
            | Self::DuplicateFolder { collection_id, .. }
            | Self::AddRequest { collection_id, .. }
            | Self::UpdateRequest { collection_id, .. }
            | Self::RenameRequest { collection_id, .. }
            | Self::DeleteRequest { collection_id, .. }
            | Self::DuplicateRequest { collection_id, .. }
            | Self::SetRequestHidden { collection_id, .. }
            | Self::SaveRequestAtNames { collection_id, .. } => Some(collection_id),
        }
    }
}
