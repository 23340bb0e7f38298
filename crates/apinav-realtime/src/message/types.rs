//! Inbound and outbound surface message type definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use apinav_core::error::AppError;
use apinav_core::types::id::{CollectionId, CorrelationId, RequestId};
use apinav_entity::{FocusContext, FolderPath, RequestRecord, Snapshot};
use apinav_storage::SnapshotVersion;

/// Messages sent by a surface to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Ask for the current snapshot.
    RequestSnapshot {},
    /// The surface finished initializing and can receive messages.
    SurfaceReady {},
    /// Apply a structural change.
    Mutate(MutateIntent),
    /// Open an existing request in the editor surface.
    #[serde(rename_all = "camelCase")]
    OpenRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Request to edit.
        request_id: RequestId,
    },
    /// Open the editor surface in add mode for a container.
    #[serde(rename_all = "camelCase")]
    OpenAddRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Container the new request goes into.
        #[serde(default)]
        folder_path: FolderPath,
    },
}

/// A mutation intent as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateIntent {
    /// Echoed back on the matching `mutationResult`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// Operation name, e.g. `addFolder`.
    pub op: String,
    /// Target collection; absent for `addCollection` and `clearCollections`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<CollectionId>,
    /// Target container path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<FolderPath>,
    /// Operation arguments.
    #[serde(default)]
    pub args: Value,
}

/// Why a correlated mutation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentError {
    /// Error kind code, e.g. `NOT_FOUND`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl From<&AppError> for IntentError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.kind.to_string(),
            message: err.message.clone(),
        }
    }
}

/// Messages sent by the host to a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// The full canonical snapshot plus focus context.
    #[serde(rename_all = "camelCase")]
    Snapshot {
        /// Every collection.
        collections: Snapshot,
        /// Collection to focus.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_collection_id: Option<CollectionId>,
        /// Folder to focus inside that collection.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_folder_path: Option<FolderPath>,
        /// Version the snapshot was saved at.
        version: SnapshotVersion,
    },
    /// Outcome of a correlated mutation intent.
    #[serde(rename_all = "camelCase")]
    MutationResult {
        /// Correlation id from the intent.
        correlation_id: CorrelationId,
        /// Whether the mutation was applied.
        ok: bool,
        /// Failure detail when `ok` is false.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<IntentError>,
    },
    /// Load a request into the editor.
    #[serde(rename_all = "camelCase")]
    EditRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// The request as currently stored.
        request: RequestRecord,
        /// Container holding the request.
        folder_path: FolderPath,
    },
    /// Switch the editor to add mode for a container.
    #[serde(rename_all = "camelCase")]
    AddRequest {
        /// Owning collection.
        collection_id: CollectionId,
        /// Container the new request goes into.
        folder_path: FolderPath,
    },
    /// A frame could not be processed.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Build a snapshot message.
    pub fn snapshot(collections: Snapshot, focus: FocusContext, version: SnapshotVersion) -> Self {
        Self::Snapshot {
            collections,
            selected_collection_id: focus.selected_collection_id,
            selected_folder_path: focus.selected_folder_path,
            version,
        }
    }

    /// Build a successful mutation result.
    pub fn mutation_ok(correlation_id: CorrelationId) -> Self {
        Self::MutationResult {
            correlation_id,
            ok: true,
            error: None,
        }
    }

    /// Build a failed mutation result.
    pub fn mutation_failed(correlation_id: CorrelationId, err: &AppError) -> Self {
        Self::MutationResult {
            correlation_id,
            ok: false,
            error: Some(IntentError::from(err)),
        }
    }

    /// Build an error message from an application error.
    pub fn error(err: &AppError) -> Self {
        Self::Error {
            code: err.kind.to_string(),
            message: err.message.clone(),
        }
    }

    /// Whether this is a full snapshot.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot { .. })
    }

    /// Whether this asks the editor to open a request or add one.
    pub fn is_edit_intent(&self) -> bool {
        matches!(self, Self::EditRequest { .. } | Self::AddRequest { .. })
    }

    /// Wire name of the command.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::MutationResult { .. } => "mutationResult",
            Self::EditRequest { .. } => "editRequest",
            Self::AddRequest { .. } => "addRequest",
            Self::Error { .. } => "error",
        }
    }
}
