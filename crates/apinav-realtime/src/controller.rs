//! Surface-side contract and the reconciling reference model.

use std::sync::Arc;

use tracing::debug;

use apinav_core::types::generator::IdGenerator;
use apinav_core::types::id::{CollectionId, CorrelationId, RequestId};
use apinav_entity::{FocusContext, FolderPath, Snapshot, TreeContainer};
use apinav_service::{Mutation, PathResolver, TreeMutator};
use apinav_storage::SnapshotVersion;

use crate::message::types::{InboundMessage, IntentError, MutateIntent, OutboundMessage};
use crate::surface::SurfaceKind;

/// What every UI surface does with the sync protocol.
///
/// Intents are fire-and-forget: `issue` renders the expected effect
/// locally and returns the frame to send; the authoritative state arrives
/// later through `on_message`.
pub trait SurfaceController {
    /// Role of this surface.
    fn kind(&self) -> SurfaceKind;

    /// Frame announcing the surface finished initializing.
    fn ready(&self) -> InboundMessage {
        InboundMessage::SurfaceReady {}
    }

    /// Render `mutation` optimistically and return the intent to send.
    fn issue(&mut self, mutation: Mutation) -> InboundMessage;

    /// Fold one host message into local state.
    fn on_message(&mut self, msg: &OutboundMessage);

    /// The tree as this surface displays it.
    fn visible_tree(&self) -> Snapshot;
}

/// The node an editor surface is working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    /// Owning collection.
    pub collection_id: CollectionId,
    /// Request being edited; `None` in add mode.
    pub request_id: Option<RequestId>,
    /// Container of the request (or of the request to add).
    pub folder_path: FolderPath,
    /// `Collection / Folder / …` label for the container.
    pub breadcrumb: String,
}

/// Reference [`SurfaceController`] holding a confirmed snapshot and an
/// optimistic overlay of intents still awaiting their result.
#[derive(Debug)]
pub struct SurfaceModel {
    kind: SurfaceKind,
    ids: Arc<dyn IdGenerator>,
    mutator: TreeMutator,
    confirmed: Snapshot,
    version: SnapshotVersion,
    focus: FocusContext,
    overlay: Snapshot,
    pending: Vec<(CorrelationId, Mutation)>,
    edit_target: Option<EditTarget>,
    last_error: Option<IntentError>,
}

impl SurfaceModel {
    /// Create an empty model. `ids` supplies correlation ids and the ids of
    /// optimistically created nodes.
    pub fn new(kind: SurfaceKind, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            kind,
            mutator: TreeMutator::new(ids.clone()),
            ids,
            confirmed: Snapshot::default(),
            version: SnapshotVersion::INITIAL,
            focus: FocusContext::none(),
            overlay: Snapshot::default(),
            pending: Vec::new(),
            edit_target: None,
            last_error: None,
        }
    }

    /// Last snapshot received from the host.
    pub fn confirmed(&self) -> &Snapshot {
        &self.confirmed
    }

    /// Confirmed snapshot with pending intents applied.
    pub fn overlay(&self) -> &Snapshot {
        &self.overlay
    }

    /// Version of the confirmed snapshot.
    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    /// Focus carried by the last snapshot.
    pub fn focus(&self) -> &FocusContext {
        &self.focus
    }

    /// Intents still awaiting a result.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Current edit target, if any.
    pub fn edit_target(&self) -> Option<&EditTarget> {
        self.edit_target.as_ref()
    }

    /// Most recent failure reported by the host.
    pub fn last_error(&self) -> Option<&IntentError> {
        self.last_error.as_ref()
    }

    /// Forget the last reported failure.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn rebuild_overlay(&mut self) {
        let mut overlay = self.confirmed.clone();
        for (_, mutation) in &self.pending {
            // A failed local apply leaves the overlay as it was.
            let _ = self.mutator.apply(&mut overlay, mutation);
        }
        self.overlay = overlay;
    }

    fn retarget(&mut self) {
        let Some(target) = self.edit_target.take() else {
            return;
        };
        let Some(collection) = self.confirmed.collection(&target.collection_id) else {
            return;
        };
        let folder_path = match &target.request_id {
            Some(request_id) => {
                let Some(path) = PathResolver::find_path_for_request(collection, request_id) else {
                    return;
                };
                path
            }
            None => target.folder_path,
        };
        let breadcrumb =
            PathResolver::build_path_label(&self.confirmed, &target.collection_id, &folder_path);
        self.edit_target = Some(EditTarget {
            collection_id: target.collection_id,
            request_id: target.request_id,
            folder_path,
            breadcrumb,
        });
    }

    fn target(
        &self,
        collection_id: &CollectionId,
        request_id: Option<RequestId>,
        folder_path: &FolderPath,
    ) -> EditTarget {
        EditTarget {
            collection_id: collection_id.clone(),
            request_id,
            folder_path: folder_path.clone(),
            breadcrumb: PathResolver::build_path_label(&self.confirmed, collection_id, folder_path),
        }
    }
}

impl SurfaceController for SurfaceModel {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn issue(&mut self, mutation: Mutation) -> InboundMessage {
        let correlation_id = CorrelationId::new(self.ids.generate());
        let _ = self.mutator.apply(&mut self.overlay, &mutation);
        let intent = MutateIntent::from_mutation(Some(correlation_id.clone()), &mutation);
        self.pending.push((correlation_id, mutation));
        InboundMessage::Mutate(intent)
    }

    fn on_message(&mut self, msg: &OutboundMessage) {
        match msg {
            OutboundMessage::Snapshot {
                collections,
                selected_collection_id,
                selected_folder_path,
                version,
            } => {
                if *version < self.version {
                    debug!(
                        received = %version,
                        confirmed = %self.version,
                        "Ignoring snapshot older than the confirmed one"
                    );
                    return;
                }
                self.confirmed = collections.clone();
                self.version = *version;
                self.focus = FocusContext {
                    selected_collection_id: selected_collection_id.clone(),
                    selected_folder_path: selected_folder_path.clone(),
                };
                self.rebuild_overlay();
                self.retarget();
            }
            OutboundMessage::MutationResult {
                correlation_id,
                ok,
                error,
            } => {
                self.pending.retain(|(id, _)| id != correlation_id);
                if !ok {
                    self.last_error = error.clone();
                    self.rebuild_overlay();
                }
            }
            OutboundMessage::EditRequest {
                collection_id,
                request,
                folder_path,
            } => {
                self.edit_target = Some(self.target(collection_id, Some(request.id.clone()), folder_path));
            }
            OutboundMessage::AddRequest {
                collection_id,
                folder_path,
            } => {
                self.edit_target = Some(self.target(collection_id, None, folder_path));
            }
            OutboundMessage::Error { code, message } => {
                self.last_error = Some(IntentError {
                    code: code.clone(),
                    message: message.clone(),
                });
            }
        }
    }

    fn visible_tree(&self) -> Snapshot {
        let mut tree = self.overlay.clone();
        if self.kind == SurfaceKind::Sidebar {
            for collection in tree.collections_mut() {
                strip_hidden(collection);
            }
        }
        tree
    }
}

fn strip_hidden(container: &mut dyn TreeContainer) {
    container.requests_mut().retain(|r| !r.hidden);
    for folder in container.folders_mut() {
        strip_hidden(folder);
    }
}
