//! Mutation intents and the persisted mutation loop.

pub mod mutation;
pub mod service;

pub use mutation::Mutation;
pub use service::{CollectionService, MutationOutcome};
