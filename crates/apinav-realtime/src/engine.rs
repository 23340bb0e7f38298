//! Host-side dispatcher: routes surface frames to the collection service
//! and fans the results back out.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use apinav_core::config::SyncConfig;
use apinav_core::error::AppError;
use apinav_core::result::AppResult;
use apinav_core::types::id::{CollectionId, CorrelationId, RequestId, SurfaceId};
use apinav_entity::{FocusContext, FolderPath};
use apinav_service::{CollectionService, Mutation, MutationOutcome, PathResolver};
use apinav_storage::Versioned;

use crate::broadcast::{BroadcastReport, SyncBroadcaster};
use crate::message::types::{InboundMessage, MutateIntent, OutboundMessage};
use crate::message::validator::parse_inbound;
use crate::metrics::SyncMetrics;
use crate::surface::{Delivery, SurfaceHandle, SurfaceKind, SurfaceRegistry};

/// Owns the surface registry and applies every inbound intent.
#[derive(Debug)]
pub struct SyncEngine {
    service: Arc<CollectionService>,
    registry: Arc<SurfaceRegistry>,
    broadcaster: Arc<SyncBroadcaster>,
    metrics: Arc<SyncMetrics>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Creates an engine over `service`.
    pub fn new(service: Arc<CollectionService>, config: SyncConfig) -> Self {
        let registry = Arc::new(SurfaceRegistry::new());
        let metrics = Arc::new(SyncMetrics::new());
        let broadcaster = Arc::new(SyncBroadcaster::new(registry.clone(), metrics.clone()));
        Self {
            service,
            registry,
            broadcaster,
            metrics,
            config,
        }
    }

    /// The collection service.
    pub fn service(&self) -> &Arc<CollectionService> {
        &self.service
    }

    /// The surface registry.
    pub fn registry(&self) -> &Arc<SurfaceRegistry> {
        &self.registry
    }

    /// Engine metrics.
    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// Registers a surface.
    ///
    /// Returns the surface handle and a receiver for outbound messages.
    /// Nothing but direct replies reaches the surface until it sends
    /// `surfaceReady`.
    pub async fn register(
        &self,
        surface_id: SurfaceId,
        kind: SurfaceKind,
    ) -> (Arc<SurfaceHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(SurfaceHandle::new(surface_id, kind, tx));

        if let Some(previous) = self.registry.add(handle.clone()) {
            warn!(surface_id = %previous.id, "Surface re-registered, previous handle closed");
            previous.mark_closed();
            self.metrics.surface_closed();
        }
        self.metrics.surface_opened();
        self.broadcaster.adopt_parked(&handle).await;

        info!(surface_id = %handle.id, kind = %kind, "Surface registered");
        (handle, rx)
    }

    /// Unregisters a surface.
    pub fn unregister(&self, surface_id: &SurfaceId) {
        if let Some(handle) = self.registry.remove(surface_id) {
            handle.mark_closed();
            self.metrics.surface_closed();
            info!(surface_id = %surface_id, kind = %handle.kind, "Surface unregistered");
        }
    }

    /// Processes one raw frame from a surface.
    ///
    /// Unparseable frames are answered with an `error` message. Only
    /// storage failures are returned.
    pub async fn handle_inbound(&self, surface_id: &SurfaceId, raw: &str) -> AppResult<()> {
        let Some(handle) = self.registry.get(surface_id) else {
            warn!(surface_id = %surface_id, "Message from unknown surface");
            return Ok(());
        };
        self.metrics.message_received();

        match parse_inbound(raw, self.config.max_message_bytes) {
            Ok(msg) => self.handle_message(&handle, msg).await,
            Err(e) => {
                debug!(surface_id = %surface_id, error = %e, "Rejected inbound frame");
                self.reply(&handle, OutboundMessage::error(&e)).await;
                Ok(())
            }
        }
    }

    /// Processes one parsed message from a surface.
    pub async fn handle_message(&self, handle: &SurfaceHandle, msg: InboundMessage) -> AppResult<()> {
        match msg {
            InboundMessage::RequestSnapshot {} => {
                let current = self.current_snapshot().await?;
                self.reply(handle, current).await;
            }
            InboundMessage::SurfaceReady {} => {
                let current = self.current_snapshot().await?;
                let report = handle.mark_ready(current).await;
                info!(
                    surface_id = %handle.id,
                    flushed_snapshot = report.flushed_snapshot,
                    flushed_edit = report.flushed_edit,
                    "Surface ready"
                );
            }
            InboundMessage::Mutate(intent) => {
                self.handle_intent(handle, intent).await?;
            }
            InboundMessage::OpenRequest {
                collection_id,
                request_id,
            } => {
                let opened = self.open_editor(&collection_id, &request_id).await;
                self.answer_open(handle, opened).await?;
            }
            InboundMessage::OpenAddRequest {
                collection_id,
                folder_path,
            } => {
                let opened = self.open_add_request(&collection_id, folder_path).await;
                self.answer_open(handle, opened).await?;
            }
        }
        Ok(())
    }

    /// Applies a mutation issued by the host itself and broadcasts the
    /// result when anything changed.
    pub async fn apply(&self, mutation: Mutation) -> AppResult<MutationOutcome> {
        self.apply_and_reply(None, mutation).await
    }

    /// Sends the current snapshot to every surface.
    pub async fn broadcast_current(&self) -> AppResult<BroadcastReport> {
        let Versioned { value, version } = self.service.snapshot().await?;
        Ok(self
            .broadcaster
            .broadcast(value, FocusContext::none(), version)
            .await)
    }

    /// Loads a request into the editor surface.
    pub async fn open_editor(
        &self,
        collection_id: &CollectionId,
        request_id: &RequestId,
    ) -> AppResult<BroadcastReport> {
        let (request, folder_path) = self.service.find_request(collection_id, request_id).await?;
        Ok(self
            .broadcaster
            .send_edit_intent(OutboundMessage::EditRequest {
                collection_id: collection_id.clone(),
                request,
                folder_path,
            })
            .await)
    }

    /// Switches the editor surface to add mode for a container.
    pub async fn open_add_request(
        &self,
        collection_id: &CollectionId,
        folder_path: FolderPath,
    ) -> AppResult<BroadcastReport> {
        let snapshot = self.service.snapshot().await?.value;
        let collection = snapshot
            .collection(collection_id)
            .ok_or_else(|| AppError::not_found(format!("Collection {collection_id} not found")))?;
        PathResolver::resolve_container(collection, &folder_path)?;
        Ok(self
            .broadcaster
            .send_edit_intent(OutboundMessage::AddRequest {
                collection_id: collection_id.clone(),
                folder_path,
            })
            .await)
    }

    async fn handle_intent(&self, handle: &SurfaceHandle, intent: MutateIntent) -> AppResult<()> {
        let correlation_id = intent.correlation_id.clone();
        let mutation = match intent.to_mutation() {
            Ok(mutation) => mutation,
            Err(e) => {
                debug!(surface_id = %handle.id, op = %intent.op, error = %e, "Malformed intent skipped");
                self.metrics.mutation_failed();
                if let Some(correlation_id) = correlation_id {
                    self.reply(handle, OutboundMessage::mutation_failed(correlation_id, &e))
                        .await;
                }
                return Ok(());
            }
        };

        let reply_to = correlation_id.map(|id| (handle, id));
        match self.apply_and_reply(reply_to, mutation).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind.is_non_fatal() => {
                debug!(surface_id = %handle.id, op = %intent.op, error = %e, "Mutation skipped");
                Ok(())
            }
            Err(e) => {
                error!(surface_id = %handle.id, op = %intent.op, error = %e, "Mutation failed");
                Err(e)
            }
        }
    }

    /// The originator's `mutationResult` always goes out before the
    /// snapshot broadcast.
    async fn apply_and_reply(
        &self,
        reply_to: Option<(&SurfaceHandle, CorrelationId)>,
        mutation: Mutation,
    ) -> AppResult<MutationOutcome> {
        let result = self.service.apply(mutation).await;
        match &result {
            Ok(outcome) => {
                if outcome.changed {
                    self.metrics.mutation_applied(outcome.retries);
                }
                if let Some((handle, correlation_id)) = reply_to {
                    self.reply(handle, OutboundMessage::mutation_ok(correlation_id)).await;
                }
                if outcome.changed {
                    self.broadcaster
                        .broadcast(outcome.snapshot.clone(), outcome.focus.clone(), outcome.version)
                        .await;
                }
            }
            Err(e) => {
                self.metrics.mutation_failed();
                if let Some((handle, correlation_id)) = reply_to {
                    self.reply(handle, OutboundMessage::mutation_failed(correlation_id, e))
                        .await;
                }
            }
        }
        result
    }

    async fn answer_open(&self, handle: &SurfaceHandle, opened: AppResult<BroadcastReport>) -> AppResult<()> {
        match opened {
            Ok(_) => Ok(()),
            Err(e) if e.kind.is_non_fatal() => {
                debug!(surface_id = %handle.id, error = %e, "Open skipped");
                self.reply(handle, OutboundMessage::error(&e)).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn current_snapshot(&self) -> AppResult<OutboundMessage> {
        let Versioned { value, version } = self.service.snapshot().await?;
        Ok(OutboundMessage::snapshot(value, FocusContext::none(), version))
    }

    async fn reply(&self, handle: &SurfaceHandle, msg: OutboundMessage) {
        match handle.send(msg).await {
            Delivery::Sent => self.metrics.messages_sent(1),
            Delivery::Buffered => self.metrics.message_buffered(),
            Delivery::Dropped => self.metrics.message_dropped(),
        }
    }
}
