//! Registered surfaces and their readiness handshake.

pub mod handle;
pub mod registry;

pub use handle::{Delivery, ReadyReport, SurfaceHandle, SurfaceKind};
pub use registry::SurfaceRegistry;
