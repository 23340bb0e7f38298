//! # apinav-core
//!
//! Core crate for the API navigator collections core. Contains the durable
//! state port, configuration schemas, typed identifiers and their
//! generators, and the unified error system.
//!
//! This crate has **no** internal dependencies on other apinav crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
