//! # apinav-realtime
//!
//! Keeps every open UI surface consistent with the canonical snapshot:
//!
//! - Inbound/outbound message vocabulary with correlated mutation results
//! - Surface registry with a ready/pending handshake per surface
//! - Full-snapshot broadcast after each saved mutation
//! - A reference [`SurfaceModel`] that renders optimistically and
//!   reconciles with each broadcast

pub mod broadcast;
pub mod controller;
pub mod engine;
pub mod message;
pub mod metrics;
pub mod surface;

pub use broadcast::{BroadcastReport, SyncBroadcaster};
pub use controller::{EditTarget, SurfaceController, SurfaceModel};
pub use engine::SyncEngine;
pub use message::{InboundMessage, IntentError, MutateIntent, OutboundMessage};
pub use metrics::SyncMetrics;
pub use surface::{Delivery, SurfaceHandle, SurfaceKind, SurfaceRegistry};
