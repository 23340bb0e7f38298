//! Sync engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Inbound frames received
    pub messages_received: AtomicU64,
    /// Outbound messages handed to a surface channel
    pub messages_sent: AtomicU64,
    /// Outbound messages held until a surface was ready
    pub messages_buffered: AtomicU64,
    /// Outbound messages lost to a full or closed channel
    pub messages_dropped: AtomicU64,
    /// Snapshot broadcasts issued
    pub broadcasts: AtomicU64,
    /// Mutations saved
    pub mutations_applied: AtomicU64,
    /// Mutations rejected (not found, malformed, storage)
    pub mutations_failed: AtomicU64,
    /// Version conflicts retried
    pub conflicts_retried: AtomicU64,
    /// Surfaces ever registered
    pub surfaces_total: AtomicU64,
    /// Surfaces currently registered
    pub surfaces_active: AtomicU64,
}

impl SyncMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an inbound frame.
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `n` sent messages.
    pub fn messages_sent(&self, n: u64) {
        self.messages_sent.fetch_add(n, Ordering::Relaxed);
    }

    /// Record a buffered message.
    pub fn message_buffered(&self) {
        self.messages_buffered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped message.
    pub fn message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a broadcast.
    pub fn broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a saved mutation and the conflicts it retried.
    pub fn mutation_applied(&self, retries: u32) {
        self.mutations_applied.fetch_add(1, Ordering::Relaxed);
        self.conflicts_retried
            .fetch_add(u64::from(retries), Ordering::Relaxed);
    }

    /// Record a rejected mutation.
    pub fn mutation_failed(&self) {
        self.mutations_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a surface registration.
    pub fn surface_opened(&self) {
        self.surfaces_total.fetch_add(1, Ordering::Relaxed);
        self.surfaces_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a surface leaving.
    pub fn surface_closed(&self) {
        // Stays at zero on a repeated unregister.
        let _ = self
            .surfaces_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_buffered: self.messages_buffered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            mutations_applied: self.mutations_applied.load(Ordering::Relaxed),
            mutations_failed: self.mutations_failed.load(Ordering::Relaxed),
            conflicts_retried: self.conflicts_retried.load(Ordering::Relaxed),
            surfaces_total: self.surfaces_total.load(Ordering::Relaxed),
            surfaces_active: self.surfaces_active.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Inbound frames received
    pub messages_received: u64,
    /// Outbound messages sent
    pub messages_sent: u64,
    /// Outbound messages buffered
    pub messages_buffered: u64,
    /// Outbound messages dropped
    pub messages_dropped: u64,
    /// Snapshot broadcasts
    pub broadcasts: u64,
    /// Mutations saved
    pub mutations_applied: u64,
    /// Mutations rejected
    pub mutations_failed: u64,
    /// Version conflicts retried
    pub conflicts_retried: u64,
    /// Surfaces ever registered
    pub surfaces_total: u64,
    /// Surfaces currently registered
    pub surfaces_active: u64,
}
