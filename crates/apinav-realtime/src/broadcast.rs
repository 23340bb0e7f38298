//! Fan-out of snapshots and edit intents to registered surfaces.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use apinav_entity::{FocusContext, Snapshot};
use apinav_storage::SnapshotVersion;

use crate::message::types::OutboundMessage;
use crate::metrics::SyncMetrics;
use crate::surface::{Delivery, SurfaceHandle, SurfaceKind, SurfaceRegistry};

/// Tally of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Messages handed to a ready surface.
    pub delivered: usize,
    /// Messages held for a surface that is not ready yet.
    pub buffered: usize,
    /// Messages lost to a full or closed channel.
    pub dropped: usize,
}

impl BroadcastReport {
    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Sent => self.delivered += 1,
            Delivery::Buffered => self.buffered += 1,
            Delivery::Dropped => self.dropped += 1,
        }
    }
}

/// Sends the canonical snapshot to every surface after each change.
///
/// Edit intents go to editor surfaces only. When no editor is registered
/// the latest intent is parked here and handed to the next editor that
/// registers.
#[derive(Debug)]
pub struct SyncBroadcaster {
    registry: Arc<SurfaceRegistry>,
    metrics: Arc<SyncMetrics>,
    parked_edit: Mutex<Option<OutboundMessage>>,
}

impl SyncBroadcaster {
    /// Create a broadcaster over `registry`.
    pub fn new(registry: Arc<SurfaceRegistry>, metrics: Arc<SyncMetrics>) -> Self {
        Self {
            registry,
            metrics,
            parked_edit: Mutex::new(None),
        }
    }

    /// Send the snapshot plus focus context to every surface.
    pub async fn broadcast(
        &self,
        snapshot: Snapshot,
        focus: FocusContext,
        version: SnapshotVersion,
    ) -> BroadcastReport {
        let msg = OutboundMessage::snapshot(snapshot, focus, version);
        let report = self.fan_out(self.registry.all(), &msg).await;
        self.metrics.broadcast();
        debug!(
            version = %version,
            delivered = report.delivered,
            buffered = report.buffered,
            dropped = report.dropped,
            "Snapshot broadcast"
        );
        report
    }

    /// Send an `editRequest`/`addRequest` intent to the editor surfaces.
    pub async fn send_edit_intent(&self, msg: OutboundMessage) -> BroadcastReport {
        let editors = self.registry.of_kind(SurfaceKind::Editor);
        if editors.is_empty() {
            debug!(command = msg.command(), "No editor registered, parking edit intent");
            *self.parked_edit.lock().await = Some(msg);
            self.metrics.message_buffered();
            return BroadcastReport {
                buffered: 1,
                ..Default::default()
            };
        }
        self.fan_out(editors, &msg).await
    }

    /// Hand a parked edit intent to a newly registered editor.
    pub async fn adopt_parked(&self, handle: &SurfaceHandle) -> Option<Delivery> {
        if handle.kind != SurfaceKind::Editor {
            return None;
        }
        let msg = self.parked_edit.lock().await.take()?;
        Some(self.deliver(handle, msg).await)
    }

    /// Whether an edit intent is waiting for an editor.
    pub async fn has_parked_edit(&self) -> bool {
        self.parked_edit.lock().await.is_some()
    }

    async fn fan_out(&self, targets: Vec<Arc<SurfaceHandle>>, msg: &OutboundMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for handle in targets {
            report.record(self.deliver(&handle, msg.clone()).await);
        }
        report
    }

    async fn deliver(&self, handle: &SurfaceHandle, msg: OutboundMessage) -> Delivery {
        let delivery = handle.deliver(msg).await;
        match delivery {
            Delivery::Sent => self.metrics.messages_sent(1),
            Delivery::Buffered => self.metrics.message_buffered(),
            Delivery::Dropped => self.metrics.message_dropped(),
        }
        delivery
    }
}
