//! Core type definitions used across the workspace.

pub mod generator;
pub mod id;

pub use generator::{IdGenerator, SequentialGenerator, UuidGenerator};
pub use id::*;
