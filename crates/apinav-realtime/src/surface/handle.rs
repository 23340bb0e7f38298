//! Individual surface handle and its readiness handshake.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use apinav_core::types::id::SurfaceId;

use crate::message::types::OutboundMessage;

/// Which role a surface plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Tree view; hides requests flagged hidden.
    Sidebar,
    /// Request editor / add panel; shows every request.
    Editor,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sidebar => write!(f, "sidebar"),
            Self::Editor => write!(f, "editor"),
        }
    }
}

/// What happened to one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the surface's channel.
    Sent,
    /// Held until the surface signals readiness.
    Buffered,
    /// Lost: the channel was full or closed.
    Dropped,
}

/// What the readiness flush delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyReport {
    /// Whether the surface was already ready before this signal.
    pub was_ready: bool,
    /// Whether a buffered snapshot was flushed (otherwise the current one was sent).
    pub flushed_snapshot: bool,
    /// Whether a buffered edit intent was flushed.
    pub flushed_edit: bool,
}

/// Readiness flag plus the latest-wins slots held until the surface is ready.
#[derive(Debug, Default)]
struct Handshake {
    ready: bool,
    pending_snapshot: Option<OutboundMessage>,
    pending_edit: Option<OutboundMessage>,
}

/// A handle to a single registered surface.
///
/// Broadcasts reach a surface only once it is ready. Until then the most
/// recent snapshot and the most recent edit intent are each kept in a
/// single slot; [`SurfaceHandle::mark_ready`] flushes them exactly once.
#[derive(Debug)]
pub struct SurfaceHandle {
    /// Surface identifier
    pub id: SurfaceId,
    /// Surface role
    pub kind: SurfaceKind,
    /// When the surface registered
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<OutboundMessage>,
    handshake: Mutex<Handshake>,
    alive: AtomicBool,
}

impl SurfaceHandle {
    /// Create a handle for a surface that has not signalled readiness yet.
    pub fn new(id: SurfaceId, kind: SurfaceKind, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id,
            kind,
            connected_at: Utc::now(),
            sender,
            handshake: Mutex::new(Handshake::default()),
            alive: AtomicBool::new(true),
        }
    }

    /// Send immediately, regardless of readiness. Used for direct replies.
    pub async fn send(&self, msg: OutboundMessage) -> Delivery {
        self.try_send(msg)
    }

    /// Deliver a broadcast or edit intent, buffering it if the surface is
    /// not ready yet.
    pub async fn deliver(&self, msg: OutboundMessage) -> Delivery {
        let mut handshake = self.handshake.lock().await;
        if handshake.ready {
            return self.try_send(msg);
        }
        if msg.is_snapshot() {
            handshake.pending_snapshot = Some(msg);
        } else if msg.is_edit_intent() {
            handshake.pending_edit = Some(msg);
        } else {
            return self.try_send(msg);
        }
        debug!(surface_id = %self.id, "Surface not ready, message buffered");
        Delivery::Buffered
    }

    /// Mark the surface ready and flush what was buffered: the pending
    /// snapshot (or `current` if none was buffered), then the pending edit
    /// intent.
    pub async fn mark_ready(&self, current: OutboundMessage) -> ReadyReport {
        let mut handshake = self.handshake.lock().await;
        let was_ready = handshake.ready;
        handshake.ready = true;

        let pending_snapshot = handshake.pending_snapshot.take();
        let flushed_snapshot = pending_snapshot.is_some();
        self.try_send(pending_snapshot.unwrap_or(current));

        let pending_edit = handshake.pending_edit.take();
        let flushed_edit = pending_edit.is_some();
        if let Some(edit) = pending_edit {
            self.try_send(edit);
        }

        ReadyReport {
            was_ready,
            flushed_snapshot,
            flushed_edit,
        }
    }

    /// Whether the surface has signalled readiness.
    pub async fn is_ready(&self) -> bool {
        self.handshake.lock().await.ready
    }

    /// Whether anything is waiting for readiness.
    pub async fn has_pending(&self) -> bool {
        let handshake = self.handshake.lock().await;
        handshake.pending_snapshot.is_some() || handshake.pending_edit.is_some()
    }

    /// Check if the surface's channel is still open
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the surface as gone
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    fn try_send(&self, msg: OutboundMessage) -> Delivery {
        if !self.is_alive() {
            return Delivery::Dropped;
        }
        match self.sender.try_send(msg) {
            Ok(()) => Delivery::Sent,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                warn!(
                    surface_id = %self.id,
                    command = msg.command(),
                    "Surface send buffer full, dropping message"
                );
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                Delivery::Dropped
            }
        }
    }
}
