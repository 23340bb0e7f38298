//! Folder-path addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

use apinav_core::types::id::FolderId;

/// Ordered folder ids from the collection root downward.
///
/// The empty path addresses the collection root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderPath(Vec<FolderId>);

impl FolderPath {
    /// The collection root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from its segments.
    pub fn new(segments: Vec<FolderId>) -> Self {
        Self(segments)
    }

    /// Whether this path addresses the collection root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path depth.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Same as [`FolderPath::is_root`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[FolderId] {
        &self.0
    }

    /// The innermost folder id, if any.
    pub fn last(&self) -> Option<&FolderId> {
        self.0.last()
    }

    /// The path of the containing folder; `None` at the root.
    pub fn parent(&self) -> Option<FolderPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The path of a direct child folder.
    pub fn child(&self, id: FolderId) -> FolderPath {
        let mut segments = self.0.clone();
        segments.push(id);
        Self(segments)
    }

    /// Whether `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &FolderPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<Vec<FolderId>> for FolderPath {
    fn from(segments: Vec<FolderId>) -> Self {
        Self(segments)
    }
}

impl<'a> From<&[&'a str]> for FolderPath {
    fn from(segments: &[&'a str]) -> Self {
        Self(segments.iter().map(|s| FolderId::from(*s)).collect())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for FolderPath {
    fn from(segments: [&'a str; N]) -> Self {
        Self(segments.iter().map(|s| FolderId::from(*s)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_child() {
        let root = FolderPath::root();
        assert!(root.is_root());
        let child = root.child(FolderId::new("f1")).child(FolderId::new("f2"));
        assert_eq!(child.len(), 2);
        assert_eq!(child.parent(), Some(FolderPath::from(["f1"])));
        assert!(child.starts_with(&FolderPath::from(["f1"])));
        assert_eq!(child.to_string(), "/f1/f2");
    }

    #[test]
    fn test_serializes_as_array() {
        let path = FolderPath::from(["a", "b"]);
        assert_eq!(serde_json::to_string(&path).expect("serialize"), r#"["a","b"]"#);
    }
}
