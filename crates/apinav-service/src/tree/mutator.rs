//! Structural operations on the collections tree.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use apinav_core::error::{AppError, ErrorKind};
use apinav_core::result::AppResult;
use apinav_core::types::generator::IdGenerator;
use apinav_core::types::id::{CollectionId, FolderId, RequestId};
use apinav_entity::{
    Collection, Folder, FocusContext, FolderPath, RequestPatch, RequestRecord, Snapshot,
    TreeContainer,
};

use crate::collection::Mutation;

use super::index::TreeIndex;
use super::resolver::PathResolver;

/// Suffix appended to the name of a duplicated node.
pub const COPY_SUFFIX: &str = " (Copy)";

/// What applying a [`Mutation`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationEffect {
    /// Whether the snapshot changed. Renames to the same name do not.
    pub changed: bool,
    /// Where surfaces should focus afterwards.
    pub focus: FocusContext,
    /// Id of the node the mutation created, if any.
    pub created: Option<String>,
}

impl MutationEffect {
    fn changed(focus: FocusContext) -> Self {
        Self {
            changed: true,
            focus,
            created: None,
        }
    }

    fn created(focus: FocusContext, id: impl Into<String>) -> Self {
        Self {
            changed: true,
            focus,
            created: Some(id.into()),
        }
    }

    fn flag(changed: bool, focus: FocusContext) -> Self {
        Self {
            changed,
            focus,
            created: None,
        }
    }
}

/// Applies structural edits to an in-memory [`Snapshot`].
///
/// Lookup failures return [`ErrorKind::NotFound`] and leave the snapshot
/// untouched. New nodes get ids drawn from the injected generator until
/// one is unused anywhere in the snapshot.
#[derive(Debug, Clone)]
pub struct TreeMutator {
    ids: Arc<dyn IdGenerator>,
}

impl TreeMutator {
    /// Create a mutator drawing ids from `ids`.
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Apply one mutation in place.
    pub fn apply(&self, snapshot: &mut Snapshot, mutation: &Mutation) -> AppResult<MutationEffect> {
        let effect = match mutation {
            Mutation::AddCollection { name } => {
                let id = self.add_collection(snapshot, name)?;
                MutationEffect::created(FocusContext::collection(id.clone()), id.into_inner())
            }
            Mutation::RenameCollection {
                collection_id,
                name,
            } => {
                let changed = Self::rename_collection(snapshot, collection_id, name)?;
                MutationEffect::flag(changed, FocusContext::collection(collection_id.clone()))
            }
            Mutation::DeleteCollection { collection_id } => {
                Self::delete_collection(snapshot, collection_id)?;
                MutationEffect::changed(FocusContext::none())
            }
            Mutation::DuplicateCollection { collection_id } => {
                let id = self.duplicate_collection(snapshot, collection_id)?;
                MutationEffect::created(FocusContext::collection(id.clone()), id.into_inner())
            }
            Mutation::ClearCollections => {
                let changed = Self::clear_collections(snapshot);
                MutationEffect::flag(changed, FocusContext::none())
            }
            Mutation::AddFolder {
                collection_id,
                path,
                name,
            } => {
                let id = self.add_folder(snapshot, collection_id, path, name)?;
                MutationEffect::created(
                    FocusContext::folder(collection_id.clone(), path.child(id.clone())),
                    id.into_inner(),
                )
            }
            Mutation::RenameFolder {
                collection_id,
                folder_id,
                path,
                name,
            } => {
                let (changed, parent) =
                    Self::rename_folder(snapshot, collection_id, folder_id, path.as_ref(), name)?;
                MutationEffect::flag(changed, FocusContext::folder(collection_id.clone(), parent))
            }
            Mutation::DeleteFolder {
                collection_id,
                folder_id,
                path,
            } => {
                let parent = Self::delete_folder(snapshot, collection_id, folder_id, path.as_ref())?;
                MutationEffect::changed(FocusContext::folder(collection_id.clone(), parent))
            }
            Mutation::DuplicateFolder {
                collection_id,
                folder_id,
                path,
            } => {
                let (id, parent) =
                    self.duplicate_folder(snapshot, collection_id, folder_id, path.as_ref())?;
                MutationEffect::created(
                    FocusContext::folder(collection_id.clone(), parent),
                    id.into_inner(),
                )
            }
            Mutation::AddRequest {
                collection_id,
                path,
                draft,
            } => {
                let id = self.add_request(snapshot, collection_id, path, draft)?;
                MutationEffect::created(
                    FocusContext::folder(collection_id.clone(), path.clone()),
                    id.into_inner(),
                )
            }
            Mutation::UpdateRequest {
                collection_id,
                request_id,
                path,
                patch,
            } => {
                let (changed, at) =
                    Self::update_request(snapshot, collection_id, request_id, path.as_ref(), patch)?;
                MutationEffect::flag(changed, FocusContext::folder(collection_id.clone(), at))
            }
            Mutation::RenameRequest {
                collection_id,
                request_id,
                path,
                name,
            } => {
                let (changed, at) =
                    Self::rename_request(snapshot, collection_id, request_id, path.as_ref(), name)?;
                MutationEffect::flag(changed, FocusContext::folder(collection_id.clone(), at))
            }
            Mutation::DeleteRequest {
                collection_id,
                request_id,
                path,
            } => {
                let at = Self::delete_request(snapshot, collection_id, request_id, path.as_ref())?;
                MutationEffect::changed(FocusContext::folder(collection_id.clone(), at))
            }
            Mutation::DuplicateRequest {
                collection_id,
                request_id,
                path,
            } => {
                let (id, at) =
                    self.duplicate_request(snapshot, collection_id, request_id, path.as_ref())?;
                MutationEffect::created(
                    FocusContext::folder(collection_id.clone(), at),
                    id.into_inner(),
                )
            }
            Mutation::SetRequestHidden {
                collection_id,
                request_id,
                path,
                hidden,
            } => {
                let (changed, at) = Self::set_request_hidden(
                    snapshot,
                    collection_id,
                    request_id,
                    path.as_ref(),
                    *hidden,
                )?;
                MutationEffect::flag(changed, FocusContext::folder(collection_id.clone(), at))
            }
            Mutation::SaveRequestAtNames {
                collection_id,
                folder_names,
                draft,
            } => {
                let (id, at) = self.save_request_at_names(snapshot, collection_id, folder_names, draft)?;
                MutationEffect::created(
                    FocusContext::folder(collection_id.clone(), at),
                    id.into_inner(),
                )
            }
        };

        debug!(op = mutation.op_name(), changed = effect.changed, "Mutation applied in memory");
        Ok(effect)
    }

    // ── Collections ─────────────────────────────────────────────────

    /// Insert a new empty collection at the front.
    pub fn add_collection(&self, snapshot: &mut Snapshot, name: &str) -> AppResult<CollectionId> {
        let name = require_name(name, "Collection")?;
        let mut index = TreeIndex::build(snapshot);
        let id = CollectionId::new(index.fresh_id(self.ids.as_ref()));
        let mut collection = Collection::new(id.clone(), name);
        collection.created_at = Some(Utc::now());
        snapshot.collections_mut().insert(0, collection);
        Ok(id)
    }

    /// Rename a collection; returns `false` when the name is unchanged.
    pub fn rename_collection(
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        name: &str,
    ) -> AppResult<bool> {
        let name = require_name(name, "Collection")?;
        let collection = collection_mut(snapshot, collection_id)?;
        Ok(replace_name(&mut collection.name, name))
    }

    /// Remove a collection and everything in it.
    pub fn delete_collection(snapshot: &mut Snapshot, collection_id: &CollectionId) -> AppResult<()> {
        let position = collection_position(snapshot, collection_id)?;
        snapshot.collections_mut().remove(position);
        Ok(())
    }

    /// Deep-copy a collection with fresh ids throughout and insert it right
    /// after the original.
    pub fn duplicate_collection(
        &self,
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
    ) -> AppResult<CollectionId> {
        let position = collection_position(snapshot, collection_id)?;
        let mut index = TreeIndex::build(snapshot);
        let mut copy = snapshot.collections()[position].clone();
        copy.id = CollectionId::new(index.fresh_id(self.ids.as_ref()));
        copy.name.push_str(COPY_SUFFIX);
        self.reassign_ids(&mut index, &mut copy);
        let id = copy.id.clone();
        snapshot.collections_mut().insert(position + 1, copy);
        Ok(id)
    }

    /// Remove every collection; returns `false` if there were none.
    pub fn clear_collections(snapshot: &mut Snapshot) -> bool {
        let changed = !snapshot.is_empty();
        snapshot.collections_mut().clear();
        changed
    }

    /// Pretty-printed JSON of one collection.
    pub fn export_collection(snapshot: &Snapshot, collection_id: &CollectionId) -> AppResult<String> {
        let collection = snapshot
            .collection(collection_id)
            .ok_or_else(|| collection_not_found(collection_id))?;
        serde_json::to_string_pretty(collection).map_err(|e| {
            AppError::with_source(ErrorKind::Serialization, "Failed to export collection", e)
        })
    }

    // ── Folders ─────────────────────────────────────────────────────

    /// Insert a new empty folder at the front of the container at `path`.
    pub fn add_folder(
        &self,
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        path: &FolderPath,
        name: &str,
    ) -> AppResult<FolderId> {
        let name = require_name(name, "Folder")?;
        let mut index = TreeIndex::build(snapshot);
        let collection = collection_mut(snapshot, collection_id)?;
        let container = PathResolver::resolve_container_mut(collection, path)?;
        let id = FolderId::new(index.fresh_id(self.ids.as_ref()));
        container.folders_mut().insert(0, Folder::new(id.clone(), name));
        Ok(id)
    }

    /// Rename a folder. Returns whether the name changed and the path of
    /// the folder's parent.
    pub fn rename_folder(
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        folder_id: &FolderId,
        path: Option<&FolderPath>,
        name: &str,
    ) -> AppResult<(bool, FolderPath)> {
        let name = require_name(name, "Folder")?;
        let parent = folder_parent(snapshot, collection_id, folder_id, path)?;
        let folder = folder_in_mut(snapshot, collection_id, &parent, folder_id)?;
        Ok((replace_name(&mut folder.name, name), parent))
    }

    /// Remove a folder and its whole subtree. Returns the parent path.
    pub fn delete_folder(
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        folder_id: &FolderId,
        path: Option<&FolderPath>,
    ) -> AppResult<FolderPath> {
        let parent = folder_parent(snapshot, collection_id, folder_id, path)?;
        let siblings = siblings_mut(snapshot, collection_id, &parent)?;
        let position = folder_position(siblings, folder_id)?;
        siblings.remove(position);
        Ok(parent)
    }

    /// Deep-copy a folder with fresh ids throughout and insert it right
    /// after the original. Returns the copy's id and the parent path.
    pub fn duplicate_folder(
        &self,
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        folder_id: &FolderId,
        path: Option<&FolderPath>,
    ) -> AppResult<(FolderId, FolderPath)> {
        let parent = folder_parent(snapshot, collection_id, folder_id, path)?;
        let mut index = TreeIndex::build(snapshot);
        let siblings = siblings_mut(snapshot, collection_id, &parent)?;
        let position = folder_position(siblings, folder_id)?;

        let mut copy = siblings[position].clone();
        copy.id = FolderId::new(index.fresh_id(self.ids.as_ref()));
        copy.name.push_str(COPY_SUFFIX);
        self.reassign_ids(&mut index, &mut copy);

        let id = copy.id.clone();
        siblings.insert(position + 1, copy);
        Ok((id, parent))
    }

    // ── Requests ────────────────────────────────────────────────────

    /// Insert a new request built from `draft` at the front of the
    /// container at `path`.
    pub fn add_request(
        &self,
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        path: &FolderPath,
        draft: &RequestPatch,
    ) -> AppResult<RequestId> {
        let mut index = TreeIndex::build(snapshot);
        let collection = collection_mut(snapshot, collection_id)?;
        let container = PathResolver::resolve_container_mut(collection, path)?;
        let id = RequestId::new(index.fresh_id(self.ids.as_ref()));
        container
            .requests_mut()
            .insert(0, RequestRecord::from_patch(id.clone(), draft, Utc::now()));
        Ok(id)
    }

    /// Shallow-merge `patch` into a request. Returns whether anything
    /// changed and the request's container path.
    pub fn update_request(
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        request_id: &RequestId,
        path: Option<&FolderPath>,
        patch: &RequestPatch,
    ) -> AppResult<(bool, FolderPath)> {
        let (request, at) = request_mut(snapshot, collection_id, request_id, path)?;
        Ok((patch.apply(request, Utc::now()), at))
    }

    /// Rename a request.
    pub fn rename_request(
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        request_id: &RequestId,
        path: Option<&FolderPath>,
        name: &str,
    ) -> AppResult<(bool, FolderPath)> {
        let name = require_name(name, "Request")?;
        let (request, at) = request_mut(snapshot, collection_id, request_id, path)?;
        let changed = replace_name(&mut request.name, name);
        if changed {
            request.updated_at = Some(Utc::now());
        }
        Ok((changed, at))
    }

    /// Remove exactly one request. Returns its former container path.
    pub fn delete_request(
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        request_id: &RequestId,
        path: Option<&FolderPath>,
    ) -> AppResult<FolderPath> {
        let at = request_path(snapshot, collection_id, request_id, path)?;
        let requests = requests_mut(snapshot, collection_id, &at)?;
        let position = request_position(requests, request_id)?;
        requests.remove(position);
        Ok(at)
    }

    /// Copy a request under a fresh id and `" (Copy)"` name, right after
    /// the original. Every other field, timestamps included, is kept.
    pub fn duplicate_request(
        &self,
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        request_id: &RequestId,
        path: Option<&FolderPath>,
    ) -> AppResult<(RequestId, FolderPath)> {
        let at = request_path(snapshot, collection_id, request_id, path)?;
        let mut index = TreeIndex::build(snapshot);
        let requests = requests_mut(snapshot, collection_id, &at)?;
        let position = request_position(requests, request_id)?;

        let mut copy = requests[position].clone();
        copy.id = RequestId::new(index.fresh_id(self.ids.as_ref()));
        copy.name.push_str(COPY_SUFFIX);

        let id = copy.id.clone();
        requests.insert(position + 1, copy);
        Ok((id, at))
    }

    /// Set the canonical hidden flag of a request.
    pub fn set_request_hidden(
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        request_id: &RequestId,
        path: Option<&FolderPath>,
        hidden: bool,
    ) -> AppResult<(bool, FolderPath)> {
        let (request, at) = request_mut(snapshot, collection_id, request_id, path)?;
        let changed = request.hidden != hidden;
        request.hidden = hidden;
        Ok((changed, at))
    }

    /// Walk `folder_names` from the collection root, appending any folder
    /// that does not exist yet, then insert a request built from `draft`
    /// at the front of the innermost folder.
    pub fn save_request_at_names(
        &self,
        snapshot: &mut Snapshot,
        collection_id: &CollectionId,
        folder_names: &[String],
        draft: &RequestPatch,
    ) -> AppResult<(RequestId, FolderPath)> {
        for name in folder_names {
            require_name(name, "Folder")?;
        }
        let mut index = TreeIndex::build(snapshot);
        let collection = collection_mut(snapshot, collection_id)?;

        let mut path = FolderPath::root();
        let mut container: &mut dyn TreeContainer = collection;
        for name in folder_names {
            let folders = container.folders_mut();
            let position = match folders.iter().position(|f| &f.name == name) {
                Some(position) => position,
                None => {
                    let id = FolderId::new(index.fresh_id(self.ids.as_ref()));
                    folders.push(Folder::new(id, name.clone()));
                    folders.len() - 1
                }
            };
            let folder = &mut folders[position];
            path = path.child(folder.id.clone());
            container = folder;
        }

        let id = RequestId::new(index.fresh_id(self.ids.as_ref()));
        container
            .requests_mut()
            .insert(0, RequestRecord::from_patch(id.clone(), draft, Utc::now()));
        Ok((id, path))
    }

    /// Give every folder and request below `node` a fresh id.
    fn reassign_ids<C>(&self, index: &mut TreeIndex, node: &mut C)
    where
        C: TreeContainer + ?Sized,
    {
        for request in node.requests_mut() {
            request.id = RequestId::new(index.fresh_id(self.ids.as_ref()));
        }
        for folder in node.folders_mut() {
            folder.id = FolderId::new(index.fresh_id(self.ids.as_ref()));
            self.reassign_ids(index, folder);
        }
    }
}

fn require_name<'a>(name: &'a str, what: &str) -> AppResult<&'a str> {
    if name.trim().is_empty() {
        return Err(AppError::malformed_intent(format!("{what} name cannot be empty")));
    }
    Ok(name)
}

fn replace_name(slot: &mut String, name: &str) -> bool {
    if slot == name {
        return false;
    }
    *slot = name.to_string();
    true
}

fn collection_not_found(collection_id: &CollectionId) -> AppError {
    AppError::not_found(format!("Collection {collection_id} not found"))
}

fn collection_position(snapshot: &Snapshot, collection_id: &CollectionId) -> AppResult<usize> {
    snapshot
        .position(collection_id)
        .ok_or_else(|| collection_not_found(collection_id))
}

fn collection_mut<'a>(
    snapshot: &'a mut Snapshot,
    collection_id: &CollectionId,
) -> AppResult<&'a mut Collection> {
    snapshot
        .collection_mut(collection_id)
        .ok_or_else(|| collection_not_found(collection_id))
}

/// Parent path of a folder.
///
/// A caller-supplied path must hold the folder; without one the id index
/// is consulted.
fn folder_parent(
    snapshot: &Snapshot,
    collection_id: &CollectionId,
    folder_id: &FolderId,
    path: Option<&FolderPath>,
) -> AppResult<FolderPath> {
    let collection = snapshot
        .collection(collection_id)
        .ok_or_else(|| collection_not_found(collection_id))?;
    match path {
        Some(path) => {
            let container = PathResolver::resolve_container(collection, path)?;
            folder_position(container.folders(), folder_id)
                .map_err(|_| AppError::not_found(format!("Folder {folder_id} not found at {path}")))?;
            Ok(path.clone())
        }
        None => TreeIndex::build(snapshot)
            .locate_folder(collection_id, folder_id)
            .map(|loc| loc.parent_path.clone())
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found"))),
    }
}

fn siblings_mut<'a>(
    snapshot: &'a mut Snapshot,
    collection_id: &CollectionId,
    parent: &FolderPath,
) -> AppResult<&'a mut Vec<Folder>> {
    let collection = collection_mut(snapshot, collection_id)?;
    Ok(PathResolver::resolve_container_mut(collection, parent)?.folders_mut())
}

fn folder_position(folders: &[Folder], folder_id: &FolderId) -> AppResult<usize> {
    folders
        .iter()
        .position(|f| &f.id == folder_id)
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
}

fn folder_in_mut<'a>(
    snapshot: &'a mut Snapshot,
    collection_id: &CollectionId,
    parent: &FolderPath,
    folder_id: &FolderId,
) -> AppResult<&'a mut Folder> {
    let siblings = siblings_mut(snapshot, collection_id, parent)?;
    let position = folder_position(siblings, folder_id)?;
    Ok(&mut siblings[position])
}

/// Container path of a request.
///
/// A caller-supplied path must hold the request; without one the id
/// index is consulted.
fn request_path(
    snapshot: &Snapshot,
    collection_id: &CollectionId,
    request_id: &RequestId,
    path: Option<&FolderPath>,
) -> AppResult<FolderPath> {
    let collection = snapshot
        .collection(collection_id)
        .ok_or_else(|| collection_not_found(collection_id))?;
    match path {
        Some(path) => {
            PathResolver::find_request(collection, path, request_id)?;
            Ok(path.clone())
        }
        None => TreeIndex::build(snapshot)
            .locate_request(collection_id, request_id)
            .map(|loc| loc.parent_path.clone())
            .ok_or_else(|| AppError::not_found(format!("Request {request_id} not found"))),
    }
}

fn requests_mut<'a>(
    snapshot: &'a mut Snapshot,
    collection_id: &CollectionId,
    at: &FolderPath,
) -> AppResult<&'a mut Vec<RequestRecord>> {
    let collection = collection_mut(snapshot, collection_id)?;
    Ok(PathResolver::resolve_container_mut(collection, at)?.requests_mut())
}

fn request_position(requests: &[RequestRecord], request_id: &RequestId) -> AppResult<usize> {
    requests
        .iter()
        .position(|r| &r.id == request_id)
        .ok_or_else(|| AppError::not_found(format!("Request {request_id} not found")))
}

fn request_mut<'a>(
    snapshot: &'a mut Snapshot,
    collection_id: &CollectionId,
    request_id: &RequestId,
    path: Option<&FolderPath>,
) -> AppResult<(&'a mut RequestRecord, FolderPath)> {
    let at = request_path(snapshot, collection_id, request_id, path)?;
    let requests = requests_mut(snapshot, collection_id, &at)?;
    let position = request_position(requests, request_id)?;
    Ok((&mut requests[position], at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apinav_core::types::generator::SequentialGenerator;
    use apinav_entity::Encoded;

    fn mutator() -> TreeMutator {
        TreeMutator::new(Arc::new(SequentialGenerator::new("n")))
    }

    fn demo() -> Snapshot {
        Snapshot::new(vec![Collection::new(CollectionId::new("c1"), "Demo")])
    }

    fn c1() -> CollectionId {
        CollectionId::new("c1")
    }

    fn draft(name: &str, url: &str) -> RequestPatch {
        RequestPatch {
            name: Some(name.to_string()),
            method: Some("GET".to_string()),
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_collection_goes_first() {
        let mut snapshot = demo();
        let id = mutator().add_collection(&mut snapshot, "Second").unwrap();
        assert_eq!(snapshot.collections()[0].id, id);
        assert_eq!(snapshot.collections()[1].id, c1());
        assert!(snapshot.collections()[0].created_at.is_some());
    }

    #[test]
    fn test_blank_names_are_malformed() {
        let mut snapshot = demo();
        let err = mutator().add_collection(&mut snapshot, "   ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedIntent);
        let err = mutator()
            .add_folder(&mut snapshot, &c1(), &FolderPath::root(), "")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedIntent);
        assert_eq!(snapshot, demo());
    }

    #[test]
    fn test_folder_path_round_trip() {
        let mutator = mutator();
        let mut snapshot = demo();
        let outer = mutator
            .add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Outer")
            .unwrap();
        let outer_path = FolderPath::root().child(outer.clone());
        let inner = mutator
            .add_folder(&mut snapshot, &c1(), &outer_path, "Inner")
            .unwrap();
        let inner_path = outer_path.child(inner);

        let collection = snapshot.collection(&c1()).unwrap();
        assert_eq!(PathResolver::resolve_folder(collection, &outer_path).unwrap().name, "Outer");
        assert_eq!(PathResolver::resolve_folder(collection, &inner_path).unwrap().name, "Inner");
    }

    #[test]
    fn test_new_folders_are_most_recent_first() {
        let mutator = mutator();
        let mut snapshot = demo();
        mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "A").unwrap();
        mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "B").unwrap();
        let names: Vec<_> = snapshot.collections()[0].folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_add_folder_to_missing_path_is_not_found() {
        let mut snapshot = demo();
        let err = mutator()
            .add_folder(&mut snapshot, &c1(), &FolderPath::from(["nope"]), "X")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(snapshot, demo());
    }

    #[test]
    fn test_rename_folder_to_same_name_is_noop() {
        let mutator = mutator();
        let mut snapshot = demo();
        let id = mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Auth").unwrap();
        let before = snapshot.clone();

        let (changed, _) = TreeMutator::rename_folder(&mut snapshot, &c1(), &id, None, "Auth").unwrap();
        assert!(!changed);
        assert_eq!(snapshot, before);

        let (changed, _) = TreeMutator::rename_folder(&mut snapshot, &c1(), &id, None, "Login").unwrap();
        assert!(changed);
        assert_eq!(snapshot.collections()[0].folders[0].name, "Login");
    }

    #[test]
    fn test_delete_folder_removes_subtree() {
        let mutator = mutator();
        let mut snapshot = demo();
        let outer = mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Outer").unwrap();
        let outer_path = FolderPath::root().child(outer.clone());
        let inner = mutator.add_folder(&mut snapshot, &c1(), &outer_path, "Inner").unwrap();
        let request = mutator
            .add_request(&mut snapshot, &c1(), &outer_path.child(inner.clone()), &draft("R", "u"))
            .unwrap();

        let parent = TreeMutator::delete_folder(&mut snapshot, &c1(), &outer, None).unwrap();
        assert!(parent.is_root());
        let index = TreeIndex::build(&snapshot);
        assert!(!index.contains(inner.as_str()));
        assert!(!index.contains(request.as_str()));
    }

    #[test]
    fn test_duplicate_folder_deep_copies_with_fresh_ids() {
        let mutator = mutator();
        let mut snapshot = demo();
        let outer = mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Outer").unwrap();
        mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Other").unwrap();
        let outer_path = FolderPath::root().child(outer.clone());
        mutator.add_folder(&mut snapshot, &c1(), &outer_path, "Inner").unwrap();
        mutator
            .add_request(&mut snapshot, &c1(), &outer_path, &draft("R", "u"))
            .unwrap();

        let (copy_id, parent) = mutator.duplicate_folder(&mut snapshot, &c1(), &outer, None).unwrap();
        assert!(parent.is_root());

        let folders = &snapshot.collections()[0].folders;
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Other", "Outer", "Outer (Copy)"]);
        assert_eq!(folders[2].id, copy_id);
        assert_ne!(folders[2].folders[0].id, folders[1].folders[0].id);
        assert_ne!(folders[2].requests[0].id, folders[1].requests[0].id);
        assert_eq!(folders[2].requests[0].url, "u");
        assert_eq!(TreeIndex::build(&snapshot).duplicate_count(), 0);
    }

    #[test]
    fn test_duplicate_request_keeps_fields_and_position() {
        let mutator = mutator();
        let mut snapshot = demo();
        let first = mutator
            .add_request(&mut snapshot, &c1(), &FolderPath::root(), &draft("First", "u1"))
            .unwrap();
        let x = mutator
            .add_request(&mut snapshot, &c1(), &FolderPath::root(), &draft("X", "u2"))
            .unwrap();

        let (copy_id, _) = mutator.duplicate_request(&mut snapshot, &c1(), &x, None).unwrap();
        let requests = &snapshot.collections()[0].requests;
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].id, x);
        assert_eq!(requests[1].id, copy_id);
        assert_eq!(requests[2].id, first);

        let mut expected = requests[0].clone();
        expected.id = copy_id;
        expected.name = "X (Copy)".to_string();
        assert_eq!(requests[1], expected);
    }

    #[test]
    fn test_delete_request_removes_exactly_one() {
        let mutator = mutator();
        let mut snapshot = demo();
        for n in 0..3 {
            mutator
                .add_request(&mut snapshot, &c1(), &FolderPath::root(), &draft(&format!("R{n}"), "u"))
                .unwrap();
        }
        let victim = snapshot.collections()[0].requests[1].id.clone();
        TreeMutator::delete_request(&mut snapshot, &c1(), &victim, Some(&FolderPath::root())).unwrap();
        assert_eq!(snapshot.collections()[0].requests.len(), 2);
        assert!(PathResolver::find_path_for_request(&snapshot.collections()[0], &victim).is_none());
    }

    #[test]
    fn test_update_request_merges() {
        let mutator = mutator();
        let mut snapshot = demo();
        let mut with_headers = draft("R", "old");
        with_headers.headers = Some(Encoded::new([("Accept".to_string(), "*/*".to_string())].into()));
        with_headers.description = Some("keep me".to_string());
        let id = mutator
            .add_request(&mut snapshot, &c1(), &FolderPath::root(), &with_headers)
            .unwrap();

        let patch = RequestPatch {
            url: Some("new".to_string()),
            ..Default::default()
        };
        let (changed, _) = TreeMutator::update_request(&mut snapshot, &c1(), &id, None, &patch).unwrap();
        assert!(changed);
        let request = &snapshot.collections()[0].requests[0];
        assert_eq!(request.url, "new");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.description, "keep me");

        let clear = RequestPatch {
            description: Some(String::new()),
            ..Default::default()
        };
        TreeMutator::update_request(&mut snapshot, &c1(), &id, None, &clear).unwrap();
        assert_eq!(snapshot.collections()[0].requests[0].description, "");
    }

    #[test]
    fn test_request_ops_reject_wrong_path() {
        let mutator = mutator();
        let mut snapshot = demo();
        let folder = mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "F").unwrap();
        let id = mutator
            .add_request(&mut snapshot, &c1(), &FolderPath::root(), &draft("R", "u"))
            .unwrap();
        let wrong = FolderPath::root().child(folder);
        let err = TreeMutator::rename_request(&mut snapshot, &c1(), &id, Some(&wrong), "New")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(snapshot.collections()[0].requests[0].name, "R");
    }

    #[test]
    fn test_folder_ops_check_supplied_path() {
        let mutator = mutator();
        let mut snapshot = demo();
        let outer = mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Outer").unwrap();
        let outer_path = FolderPath::root().child(outer.clone());
        let inner = mutator.add_folder(&mut snapshot, &c1(), &outer_path, "Inner").unwrap();
        let before = snapshot.clone();

        // Inner lives under Outer, not at the root.
        let stale = FolderPath::root();
        let err = TreeMutator::rename_folder(&mut snapshot, &c1(), &inner, Some(&stale), "X")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = TreeMutator::delete_folder(&mut snapshot, &c1(), &inner, Some(&stale)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = mutator
            .duplicate_folder(&mut snapshot, &c1(), &inner, Some(&stale))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(snapshot, before);

        let (changed, parent) =
            TreeMutator::rename_folder(&mut snapshot, &c1(), &inner, Some(&outer_path), "Renamed")
                .unwrap();
        assert!(changed);
        assert_eq!(parent, outer_path);
        assert_eq!(snapshot.collections()[0].folders[0].folders[0].name, "Renamed");
    }

    #[test]
    fn test_set_hidden_touches_only_flag() {
        let mutator = mutator();
        let mut snapshot = demo();
        let id = mutator
            .add_request(&mut snapshot, &c1(), &FolderPath::root(), &draft("R", "u"))
            .unwrap();
        let before = snapshot.collections()[0].requests[0].clone();

        let (changed, _) =
            TreeMutator::set_request_hidden(&mut snapshot, &c1(), &id, None, true).unwrap();
        assert!(changed);
        let after = &snapshot.collections()[0].requests[0];
        assert!(after.hidden);
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(after.name, before.name);
    }

    #[test]
    fn test_save_request_at_names_creates_missing_folders() {
        let mutator = mutator();
        let mut snapshot = demo();
        let existing = mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Users").unwrap();
        mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "Zeta").unwrap();

        let names = vec!["Users".to_string(), "Admin".to_string()];
        let (id, path) = mutator
            .save_request_at_names(&mut snapshot, &c1(), &names, &draft("List", "u"))
            .unwrap();

        assert_eq!(path.len(), 2);
        assert_eq!(path.segments()[0], existing);
        let collection = snapshot.collection(&c1()).unwrap();
        assert_eq!(PathResolver::find_path_for_request(collection, &id), Some(path.clone()));
        assert_eq!(PathResolver::resolve_folder(collection, &path).unwrap().name, "Admin");
        // No second "Users" folder was created.
        assert_eq!(collection.folders.len(), 2);
    }

    #[test]
    fn test_duplicate_collection_inserted_after_original() {
        let mutator = mutator();
        let mut snapshot = demo();
        mutator.add_folder(&mut snapshot, &c1(), &FolderPath::root(), "F").unwrap();
        mutator.add_collection(&mut snapshot, "Front").unwrap();

        let copy = mutator.duplicate_collection(&mut snapshot, &c1()).unwrap();
        let names: Vec<_> = snapshot.collections().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Front", "Demo", "Demo (Copy)"]);
        assert_eq!(snapshot.collections()[2].id, copy);
        assert_ne!(
            snapshot.collections()[2].folders[0].id,
            snapshot.collections()[1].folders[0].id
        );
    }

    #[test]
    fn test_apply_reports_focus() {
        let mutator = mutator();
        let mut snapshot = demo();
        let effect = mutator
            .apply(
                &mut snapshot,
                &Mutation::AddFolder {
                    collection_id: c1(),
                    path: FolderPath::root(),
                    name: "Auth".to_string(),
                },
            )
            .unwrap();
        let folder_id = FolderId::new(effect.created.clone().unwrap());
        assert_eq!(
            effect.focus,
            FocusContext::folder(c1(), FolderPath::root().child(folder_id))
        );

        let effect = mutator
            .apply(&mut snapshot, &Mutation::DeleteCollection { collection_id: c1() })
            .unwrap();
        assert!(effect.changed);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_export_collection_is_pretty_json() {
        let json = TreeMutator::export_collection(&demo(), &c1()).unwrap();
        assert!(json.contains("\n"));
        let back: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "Demo");
    }
}
