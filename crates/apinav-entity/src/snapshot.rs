//! The canonical snapshot and the focus context broadcast alongside it.

use serde::{Deserialize, Serialize};

use apinav_core::types::id::CollectionId;

use crate::collection::{Collection, FolderPath};

/// The full ordered list of collections.
///
/// Serialized as a bare JSON array; there is no envelope and no schema
/// version field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<Collection>);

impl Snapshot {
    /// Wrap a list of collections.
    pub fn new(collections: Vec<Collection>) -> Self {
        Self(collections)
    }

    /// The collections in user-visible order.
    pub fn collections(&self) -> &[Collection] {
        &self.0
    }

    /// Mutable access to the collection list.
    pub fn collections_mut(&mut self) -> &mut Vec<Collection> {
        &mut self.0
    }

    /// Find a collection by id.
    pub fn collection(&self, id: &CollectionId) -> Option<&Collection> {
        self.0.iter().find(|c| &c.id == id)
    }

    /// Find a collection by id for mutation.
    pub fn collection_mut(&mut self, id: &CollectionId) -> Option<&mut Collection> {
        self.0.iter_mut().find(|c| &c.id == id)
    }

    /// Index of a collection in the list.
    pub fn position(&self, id: &CollectionId) -> Option<usize> {
        self.0.iter().position(|c| &c.id == id)
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no collections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the collection list.
    pub fn into_inner(self) -> Vec<Collection> {
        self.0
    }
}

impl From<Vec<Collection>> for Snapshot {
    fn from(collections: Vec<Collection>) -> Self {
        Self(collections)
    }
}

/// Which collection and folder a surface should focus after a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusContext {
    /// Collection to select.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_collection_id: Option<CollectionId>,
    /// Folder to select inside that collection; `None` means the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_folder_path: Option<FolderPath>,
}

impl FocusContext {
    /// No focus change.
    pub fn none() -> Self {
        Self::default()
    }

    /// Focus a collection root.
    pub fn collection(id: CollectionId) -> Self {
        Self {
            selected_collection_id: Some(id),
            selected_folder_path: None,
        }
    }

    /// Focus a folder; an empty path collapses to the collection root.
    pub fn folder(id: CollectionId, path: FolderPath) -> Self {
        Self {
            selected_collection_id: Some(id),
            selected_folder_path: if path.is_root() { None } else { Some(path) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_bare_array() {
        let snapshot = Snapshot::new(vec![Collection::new(CollectionId::new("c1"), "Demo")]);
        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.starts_with('['));
        let back: Snapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_root_folder_focus_collapses() {
        let focus = FocusContext::folder(CollectionId::new("c1"), FolderPath::root());
        assert_eq!(focus.selected_folder_path, None);
        let focus = FocusContext::folder(CollectionId::new("c1"), FolderPath::from(["f1"]));
        assert_eq!(focus.selected_folder_path, Some(FolderPath::from(["f1"])));
    }
}
