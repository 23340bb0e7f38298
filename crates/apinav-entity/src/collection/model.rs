//! Collection and folder entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use apinav_core::types::id::{CollectionId, FolderId};

use super::request::RequestRecord;

/// Shared shape of every node that owns sub-folders and requests.
///
/// A [`Collection`] is a [`Folder`] plus top-level metadata; exposing both
/// through this trait keeps path resolution a single recursive walk.
pub trait TreeContainer {
    /// Display name.
    fn name(&self) -> &str;

    /// Child folders in user-visible order.
    fn folders(&self) -> &[Folder];

    /// Mutable access to the child folders.
    fn folders_mut(&mut self) -> &mut Vec<Folder>;

    /// Request records directly inside this container.
    fn requests(&self) -> &[RequestRecord];

    /// Mutable access to the direct request records.
    fn requests_mut(&mut self) -> &mut Vec<RequestRecord>;

    /// Number of requests in this container and every descendant folder.
    fn total_requests(&self) -> usize {
        self.requests().len()
            + self
                .folders()
                .iter()
                .map(|f| f.total_requests())
                .sum::<usize>()
    }

    /// Number of descendant folders at any depth.
    fn total_folders(&self) -> usize {
        self.folders().len()
            + self
                .folders()
                .iter()
                .map(|f| f.total_folders())
                .sum::<usize>()
    }
}

/// Root of a request tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Unique collection identifier.
    pub id: CollectionId,
    /// Collection name.
    pub name: String,
    /// Top-level folders, most recent first.
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// Requests at the collection root, most recent first.
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
    /// When the collection was created, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            folders: Vec::new(),
            requests: Vec::new(),
            created_at: None,
        }
    }
}

impl TreeContainer for Collection {
    fn name(&self) -> &str {
        &self.name
    }

    fn folders(&self) -> &[Folder] {
        &self.folders
    }

    fn folders_mut(&mut self) -> &mut Vec<Folder> {
        &mut self.folders
    }

    fn requests(&self) -> &[RequestRecord] {
        &self.requests
    }

    fn requests_mut(&mut self) -> &mut Vec<RequestRecord> {
        &mut self.requests
    }
}

/// A named, nestable container of folders and requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Nested folders, unbounded depth.
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// Requests directly in this folder.
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
}

impl Folder {
    /// Create an empty folder.
    pub fn new(id: FolderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            folders: Vec::new(),
            requests: Vec::new(),
        }
    }
}

impl TreeContainer for Folder {
    fn name(&self) -> &str {
        &self.name
    }

    fn folders(&self) -> &[Folder] {
        &self.folders
    }

    fn folders_mut(&mut self) -> &mut Vec<Folder> {
        &mut self.folders
    }

    fn requests(&self) -> &[RequestRecord] {
        &self.requests
    }

    fn requests_mut(&mut self) -> &mut Vec<RequestRecord> {
        &mut self.requests
    }
}
