//! In-memory remote tree for tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    FileEntry, FolderEntry, FolderHandle, FolderListing, HierarchyClient, ItemKind, PropertyBag,
    PropertySource,
};
use crate::error::{Result, SpmapError};

#[derive(Default)]
pub(crate) struct FakeRemote {
    root: String,
    subfolders: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<String>>,
    properties: HashMap<String, Map<String, Value>>,
    fail_listing: Option<String>,
    fail_properties: Option<String>,
    listed: Mutex<Vec<String>>,
    property_calls: Mutex<Vec<(ItemKind, String)>>,
}

impl FakeRemote {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            ..Default::default()
        }
    }

    /// Add folder `name` under `parent`, returning its path.
    pub fn folder(&mut self, parent: &str, name: &str) -> String {
        let path = format!("{}/{}", parent, name);
        self.subfolders.entry(parent.to_string()).or_default().push(path.clone());
        path
    }

    pub fn file(&mut self, folder: &str, name: &str) -> String {
        let path = format!("{}/{}", folder, name);
        self.files.entry(folder.to_string()).or_default().push(path.clone());
        path
    }

    pub fn property(&mut self, path: &str, key: &str, value: &str) {
        self.properties
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    pub fn fail_listing_at(&mut self, path: &str) {
        self.fail_listing = Some(path.to_string());
    }

    pub fn fail_properties_at(&mut self, path: &str) {
        self.fail_properties = Some(path.to_string());
    }

    /// Last path segment, as the remote reports it in `Name`
    fn name_of(path: &str) -> String {
        path.rsplit('/').next().unwrap_or(path).to_string()
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    pub fn property_calls(&self) -> Vec<(ItemKind, String)> {
        self.property_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HierarchyClient for FakeRemote {
    async fn resolve_root(&self, root_path: &str) -> Result<FolderHandle> {
        if root_path != self.root {
            return Err(SpmapError::Listing {
                path: root_path.to_string(),
                message: "Root folder does not exist".to_string(),
            });
        }
        Ok(FolderHandle::new(root_path))
    }

    async fn list_children(&self, folder: &FolderHandle) -> Result<FolderListing> {
        let path = folder.as_str().to_string();
        self.listed.lock().unwrap().push(path.clone());

        if self.fail_listing.as_deref() == Some(path.as_str()) {
            return Err(SpmapError::Listing {
                path,
                message: "403 Forbidden".to_string(),
            });
        }

        let folders = self
            .subfolders
            .get(&path)
            .into_iter()
            .flatten()
            .map(|p| FolderEntry {
                name: Self::name_of(p),
                path: p.clone(),
                handle: FolderHandle::new(p.clone()),
            })
            .collect();
        let files = self
            .files
            .get(&path)
            .into_iter()
            .flatten()
            .map(|p| FileEntry {
                name: Self::name_of(p),
                path: p.clone(),
            })
            .collect();

        Ok(FolderListing { folders, files })
    }
}

#[async_trait]
impl PropertySource for FakeRemote {
    async fn fetch_properties(&self, kind: ItemKind, path: &str) -> Result<PropertyBag> {
        self.property_calls.lock().unwrap().push((kind, path.to_string()));

        if self.fail_properties.as_deref() == Some(path) {
            return Err(SpmapError::Metadata {
                path: path.to_string(),
                message: "500 Internal Server Error".to_string(),
            });
        }

        Ok(PropertyBag::new(
            self.properties.get(path).cloned().unwrap_or_default(),
        ))
    }
}
