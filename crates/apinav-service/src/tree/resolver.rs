//! Folder-path resolution and breadcrumb labels.

use apinav_core::error::AppError;
use apinav_core::result::AppResult;
use apinav_core::types::id::{CollectionId, FolderId, RequestId};
use apinav_entity::{Collection, Folder, FolderPath, RequestRecord, Snapshot, TreeContainer};

/// Separator placed between names in a breadcrumb label.
pub const LABEL_SEPARATOR: &str = " / ";

/// Resolves folder paths inside a collection.
///
/// Every lookup walks the path one id at a time through the parent's
/// folder list; a segment that does not match ends the walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl PathResolver {
    /// Resolve `path` to a folder. The empty path has no folder and is
    /// reported as not found; use [`PathResolver::resolve_container`] to
    /// address the collection root.
    pub fn resolve_folder<'a>(collection: &'a Collection, path: &FolderPath) -> AppResult<&'a Folder> {
        let mut segments = path.segments().iter();
        let Some(first) = segments.next() else {
            return Err(AppError::not_found("Empty folder path addresses the collection root"));
        };
        let mut current = find_child(&collection.folders, first, path)?;
        for segment in segments {
            current = find_child(&current.folders, segment, path)?;
        }
        Ok(current)
    }

    /// Resolve `path` to the container it addresses: the collection itself
    /// for the empty path, otherwise the folder.
    pub fn resolve_container<'a>(
        collection: &'a Collection,
        path: &FolderPath,
    ) -> AppResult<&'a dyn TreeContainer> {
        if path.is_root() {
            return Ok(collection as &dyn TreeContainer);
        }
        let folder: &dyn TreeContainer = Self::resolve_folder(collection, path)?;
        Ok(folder)
    }

    /// Mutable counterpart of [`PathResolver::resolve_container`].
    pub fn resolve_container_mut<'a>(
        collection: &'a mut Collection,
        path: &FolderPath,
    ) -> AppResult<&'a mut dyn TreeContainer> {
        let mut current: &'a mut dyn TreeContainer = collection;
        for segment in path.segments() {
            current = current
                .folders_mut()
                .iter_mut()
                .find(|f| &f.id == segment)
                .map(|f| f as &mut dyn TreeContainer)
                .ok_or_else(|| missing_segment(segment, path))?;
        }
        Ok(current)
    }

    /// Join the collection name and each resolved folder name with
    /// [`LABEL_SEPARATOR`].
    ///
    /// Stops silently at the first unresolved segment, so a stale path
    /// yields a shorter label. An unknown collection yields an empty label.
    pub fn build_path_label(
        snapshot: &Snapshot,
        collection_id: &CollectionId,
        path: &FolderPath,
    ) -> String {
        let Some(collection) = snapshot.collection(collection_id) else {
            return String::new();
        };
        let mut parts: Vec<&str> = vec![collection.name.as_str()];
        let mut folders = collection.folders.as_slice();
        for segment in path.segments() {
            match folders.iter().find(|f| &f.id == segment) {
                Some(folder) => {
                    parts.push(folder.name.as_str());
                    folders = folder.folders.as_slice();
                }
                None => break,
            }
        }
        parts.join(LABEL_SEPARATOR)
    }

    /// Depth-first search for the folder path owning `request_id`.
    ///
    /// Requests directly in a container are checked before its sub-folders
    /// are descended, and the first match wins.
    pub fn find_path_for_request(
        collection: &Collection,
        request_id: &RequestId,
    ) -> Option<FolderPath> {
        let mut trail = Vec::new();
        if search_requests(collection, request_id, &mut trail) {
            Some(FolderPath::new(trail))
        } else {
            None
        }
    }

    /// Depth-first search for the full path of a folder, the folder itself
    /// included as the last segment.
    pub fn find_path_for_folder(collection: &Collection, folder_id: &FolderId) -> Option<FolderPath> {
        let mut trail = Vec::new();
        if search_folders(&collection.folders, folder_id, &mut trail) {
            Some(FolderPath::new(trail))
        } else {
            None
        }
    }

    /// Find a request directly inside the container at `path`.
    pub fn find_request<'a>(
        collection: &'a Collection,
        path: &FolderPath,
        request_id: &RequestId,
    ) -> AppResult<&'a RequestRecord> {
        Self::resolve_container(collection, path)?
            .requests()
            .iter()
            .find(|r| &r.id == request_id)
            .ok_or_else(|| AppError::not_found(format!("Request {request_id} not found at {path}")))
    }
}

fn find_child<'a>(folders: &'a [Folder], id: &FolderId, path: &FolderPath) -> AppResult<&'a Folder> {
    folders
        .iter()
        .find(|f| &f.id == id)
        .ok_or_else(|| missing_segment(id, path))
}

fn missing_segment(segment: &FolderId, path: &FolderPath) -> AppError {
    AppError::not_found(format!("Folder {segment} of path {path} not found"))
}

fn search_requests<C>(node: &C, request_id: &RequestId, trail: &mut Vec<FolderId>) -> bool
where
    C: TreeContainer + ?Sized,
{
    if node.requests().iter().any(|r| &r.id == request_id) {
        return true;
    }
    for folder in node.folders() {
        trail.push(folder.id.clone());
        if search_requests(folder, request_id, trail) {
            return true;
        }
        trail.pop();
    }
    false
}

fn search_folders(folders: &[Folder], folder_id: &FolderId, trail: &mut Vec<FolderId>) -> bool {
    for folder in folders {
        trail.push(folder.id.clone());
        if &folder.id == folder_id || search_folders(&folder.folders, folder_id, trail) {
            return true;
        }
        trail.pop();
    }
    false
}
