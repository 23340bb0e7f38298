//! # apinav-service
//!
//! Business logic for the collections tree. [`PathResolver`] and
//! [`TreeIndex`] answer "where is this node", [`TreeMutator`] performs
//! structural edits on an in-memory [`Snapshot`](apinav_entity::Snapshot),
//! and [`CollectionService`] runs every edit as one load → mutate → save
//! cycle against the [`CollectionStore`](apinav_storage::CollectionStore).
//! [`HistoryService`] and [`ApiCatalogService`] run the same cycle over
//! the side lists through [`update_document`].
//!
//! Services follow constructor injection; dependencies are handed in as
//! `Arc` references when the service is built.

pub mod collection;
pub mod document;
pub mod history;
pub mod tree;

pub use collection::{CollectionService, Mutation, MutationOutcome};
pub use document::{DocumentUpdate, SavePolicy, update_document};
pub use history::{ApiCatalogService, HistoryService};
pub use tree::{MutationEffect, NodeKind, NodeLocation, PathResolver, TreeIndex, TreeMutator};
