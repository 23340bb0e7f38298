//! Tree navigation and structural mutation.

pub mod index;
pub mod mutator;
pub mod resolver;

pub use index::{NodeKind, NodeLocation, TreeIndex};
pub use mutator::{MutationEffect, TreeMutator};
pub use resolver::PathResolver;
