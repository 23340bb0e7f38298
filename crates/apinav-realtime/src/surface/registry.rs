//! Surface registry keyed by surface id.

use std::sync::Arc;

use dashmap::DashMap;

use apinav_core::types::id::SurfaceId;

use super::handle::{SurfaceHandle, SurfaceKind};

/// Thread-safe registry of live surfaces.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    by_id: DashMap<SurfaceId, Arc<SurfaceHandle>>,
}

impl SurfaceRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
        }
    }

    /// Adds a surface, replacing any previous surface with the same id.
    pub fn add(&self, handle: Arc<SurfaceHandle>) -> Option<Arc<SurfaceHandle>> {
        self.by_id.insert(handle.id.clone(), handle)
    }

    /// Removes a surface.
    pub fn remove(&self, id: &SurfaceId) -> Option<Arc<SurfaceHandle>> {
        self.by_id.remove(id).map(|(_, handle)| handle)
    }

    /// Gets a surface by id.
    pub fn get(&self, id: &SurfaceId) -> Option<Arc<SurfaceHandle>> {
        self.by_id.get(id).map(|entry| entry.value().clone())
    }

    /// Returns every registered surface.
    pub fn all(&self) -> Vec<Arc<SurfaceHandle>> {
        self.by_id.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Returns the surfaces of one kind.
    pub fn of_kind(&self, kind: SurfaceKind) -> Vec<Arc<SurfaceHandle>> {
        self.by_id
            .iter()
            .filter(|entry| entry.value().kind == kind)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns the number of registered surfaces.
    pub fn count(&self) -> usize {
        self.by_id.len()
    }
}
