//! Core traits defined in `apinav-core` and implemented by other crates.

pub mod state;

pub use state::StateBackend;
