//! Remote hierarchy seam: folder listing and per-item property bags.
//!
//! The traversal only talks to these two traits, so tests can substitute an
//! in-memory tree for the SharePoint REST client.

pub mod auth;
pub mod sharepoint;

#[cfg(test)]
pub(crate) mod fake;

pub use sharepoint::SharePointClient;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Opaque reference to a remote folder.
///
/// Obtained from [`HierarchyClient::resolve_root`] or from a previous listing;
/// callers never build one from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderHandle(String);

impl FolderHandle {
    pub fn new(server_relative_url: impl Into<String>) -> Self {
        Self(server_relative_url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A direct subfolder as returned by a listing
#[derive(Debug, Clone)]
pub struct FolderEntry {
    pub name: String,
    /// Canonical server-relative path, globally unique
    pub path: String,
    pub handle: FolderHandle,
}

/// A direct file as returned by a listing
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
}

/// Direct children of one folder, in remote listing order
#[derive(Debug, Clone, Default)]
pub struct FolderListing {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

/// Whether a path names a folder or a file; the remote addresses them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Folder,
    File,
}

/// An item's key/value metadata as returned by the remote store.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag(Map<String, Value>);

impl PropertyBag {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Text value of a property, with blank treated as absent.
    ///
    /// Missing keys, JSON null and empty or whitespace-only strings all yield
    /// `None`. Non-string scalars are rendered as their JSON text.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Lists the remote folder tree.
#[async_trait]
pub trait HierarchyClient: Send + Sync {
    /// Resolve the configured root path into a handle, failing if it is unreachable.
    async fn resolve_root(&self, root_path: &str) -> Result<FolderHandle>;

    /// Direct subfolders and files of `folder`. Exactly one remote request.
    async fn list_children(&self, folder: &FolderHandle) -> Result<FolderListing>;
}

/// Fetches the property bag of a single item.
#[async_trait]
pub trait PropertySource: Send + Sync {
    async fn fetch_properties(&self, kind: ItemKind, path: &str) -> Result<PropertyBag>;
}
