//! Cross-surface synchronization configuration.

use serde::{Deserialize, Serialize};

/// Settings for the broadcast/handshake engine and the mutation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Outbound message buffer per surface.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Reject saves whose snapshot version is stale. When disabled, the
    /// last writer wins and concurrent mutations can be lost.
    #[serde(default = "default_true")]
    pub optimistic_concurrency: bool,
    /// How many times a mutation is reloaded and reapplied after a
    /// version conflict before giving up.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Maximum accepted inbound frame size in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            optimistic_concurrency: true,
            max_conflict_retries: default_max_conflict_retries(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_max_message_bytes() -> usize {
    1_048_576 // 1 MiB
}
