//! RepositorySource trait: the abstraction over a repository host.
//!
//! The retrieval pipeline needs three capabilities from a host: look up
//! the default branch, list the recursive tree of a branch, and read the
//! raw content of one file. Implementations: the GitHub REST client, and
//! in-memory fakes in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
}

/// A single entry of a recursive repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
        }
    }

    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// A recursive tree listing, in the host's traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,

    /// The host cut the listing short (very large repositories).
    #[serde(default)]
    pub truncated: bool,
}

impl TreeListing {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Self {
            entries,
            truncated: false,
        }
    }
}

/// The core RepositorySource trait.
///
/// `NotFound` from `default_branch` means the repository is missing or
/// inaccessible; from `list_tree` it means the branch does not resolve.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// A human-readable name for this source (e.g., "github").
    fn name(&self) -> &str;

    /// Look up the repository's default branch.
    async fn default_branch(&self, owner: &str, name: &str) -> Result<String, SourceError>;

    /// List every entry of `branch`, recursively, in one call.
    async fn list_tree(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
    ) -> Result<TreeListing, SourceError>;

    /// Read the raw content of `path` at `branch`.
    async fn fetch_raw(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
        path: &str,
    ) -> Result<String, SourceError>;

    /// Whether the host is reachable.
    async fn health_check(&self) -> Result<bool, SourceError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptySource;

    #[async_trait]
    impl RepositorySource for EmptySource {
        fn name(&self) -> &str {
            "empty"
        }

        async fn default_branch(&self, _owner: &str, _name: &str) -> Result<String, SourceError> {
            Ok("main".into())
        }

        async fn list_tree(
            &self,
            _owner: &str,
            _name: &str,
            _branch: &str,
        ) -> Result<TreeListing, SourceError> {
            Ok(TreeListing::default())
        }

        async fn fetch_raw(
            &self,
            _owner: &str,
            _name: &str,
            _branch: &str,
            path: &str,
        ) -> Result<String, SourceError> {
            Err(SourceError::NotFound(path.into()))
        }
    }

    #[tokio::test]
    async fn default_health_check_is_ok() {
        let source = EmptySource;
        assert!(source.health_check().await.unwrap());
        assert_eq!(source.default_branch("o", "n").await.unwrap(), "main");
    }

    #[test]
    fn tree_entry_kinds() {
        assert!(TreeEntry::blob("README.md").is_blob());
        assert!(!TreeEntry::tree("docs").is_blob());
        let json = serde_json::to_string(&TreeEntry::blob("a.md")).unwrap();
        assert!(json.contains("\"blob\""));
    }
}
