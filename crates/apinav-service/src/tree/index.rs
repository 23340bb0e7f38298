//! Id → location arena map over a snapshot.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use apinav_core::types::generator::IdGenerator;
use apinav_core::types::id::{CollectionId, FolderId, RequestId};
use apinav_entity::{Folder, FolderPath, Snapshot, TreeContainer};

/// What kind of node an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A collection root.
    Collection,
    /// A folder.
    Folder,
    /// A request record.
    Request,
}

/// Where a node lives in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    /// Node kind.
    pub kind: NodeKind,
    /// Owning collection (the node itself for collections).
    pub collection_id: CollectionId,
    /// Path of the container holding the node; the root for collections
    /// and for top-level folders and requests.
    pub parent_path: FolderPath,
}

impl NodeLocation {
    /// Id of the parent folder, `None` when the parent is the collection root.
    pub fn parent_id(&self) -> Option<&FolderId> {
        self.parent_path.last()
    }
}

/// Flat lookup of every id in a snapshot.
///
/// Rebuilt from the tree before each mutation; the tree stays the source
/// of ordering and serialization. Ids are unique across node kinds.
#[derive(Debug, Default)]
pub struct TreeIndex {
    nodes: HashMap<String, NodeLocation>,
    reserved: HashSet<String>,
    duplicates: usize,
}

impl TreeIndex {
    /// Index every node of `snapshot`.
    ///
    /// When an id occurs more than once the first occurrence in
    /// depth-first order (requests before sub-folders) is kept.
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut index = Self::default();
        for collection in snapshot.collections() {
            index.insert(
                collection.id.as_str(),
                NodeLocation {
                    kind: NodeKind::Collection,
                    collection_id: collection.id.clone(),
                    parent_path: FolderPath::root(),
                },
            );
            index.walk(collection, &collection.id, &FolderPath::root());
        }
        if index.duplicates > 0 {
            warn!(
                duplicates = index.duplicates,
                "Snapshot contains duplicate ids, first occurrence wins"
            );
        }
        index
    }

    fn walk<C>(&mut self, node: &C, collection_id: &CollectionId, path: &FolderPath)
    where
        C: TreeContainer + ?Sized,
    {
        for request in node.requests() {
            self.insert(
                request.id.as_str(),
                NodeLocation {
                    kind: NodeKind::Request,
                    collection_id: collection_id.clone(),
                    parent_path: path.clone(),
                },
            );
        }
        for folder in node.folders() {
            self.insert_folder(folder, collection_id, path);
        }
    }

    fn insert_folder(&mut self, folder: &Folder, collection_id: &CollectionId, path: &FolderPath) {
        self.insert(
            folder.id.as_str(),
            NodeLocation {
                kind: NodeKind::Folder,
                collection_id: collection_id.clone(),
                parent_path: path.clone(),
            },
        );
        self.walk(folder, collection_id, &path.child(folder.id.clone()));
    }

    fn insert(&mut self, id: &str, location: NodeLocation) {
        if self.nodes.contains_key(id) {
            self.duplicates += 1;
            return;
        }
        self.nodes.insert(id.to_string(), location);
    }

    /// Number of indexed ids.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot was empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// How many repeated ids were skipped while building.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Whether `id` is used by any node or has been handed out by
    /// [`TreeIndex::fresh_id`].
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id) || self.reserved.contains(id)
    }

    /// Location of any node.
    pub fn get(&self, id: &str) -> Option<&NodeLocation> {
        self.nodes.get(id)
    }

    /// Location of a folder inside `collection_id`.
    pub fn locate_folder(
        &self,
        collection_id: &CollectionId,
        folder_id: &FolderId,
    ) -> Option<&NodeLocation> {
        self.located(folder_id.as_str(), NodeKind::Folder, collection_id)
    }

    /// Location of a request inside `collection_id`.
    pub fn locate_request(
        &self,
        collection_id: &CollectionId,
        request_id: &RequestId,
    ) -> Option<&NodeLocation> {
        self.located(request_id.as_str(), NodeKind::Request, collection_id)
    }

    fn located(&self, id: &str, kind: NodeKind, collection_id: &CollectionId) -> Option<&NodeLocation> {
        self.nodes
            .get(id)
            .filter(|loc| loc.kind == kind && &loc.collection_id == collection_id)
    }

    /// Draw ids from `generator` until one is unused, and reserve it.
    pub fn fresh_id(&mut self, generator: &dyn IdGenerator) -> String {
        loop {
            let candidate = generator.generate();
            if !self.contains(&candidate) {
                self.reserved.insert(candidate.clone());
                return candidate;
            }
        }
    }
}
