//! Depth-first, pre-order walk of the remote hierarchy.
//!
//! Each folder is listed exactly once. Subfolders are recorded (with their
//! parent id) when their parent is listed, and pushed onto the front of the
//! frontier so they are visited before siblings queued earlier. A folder's
//! own id is recovered from its path when it is popped, which always
//! succeeds because it was recorded while its parent was being visited.

use std::collections::{HashMap, VecDeque};

use super::enricher::{MetadataEnricher, PropertyNames};
use super::{FileRecord, FolderRecord, MissingCounts, ScanSnapshot};
use super::{ROOT_FOLDER_ID, ROOT_FOLDER_NAME, ROOT_PARENT_ID};
use crate::error::{Result, SpmapError};
use crate::remote::{FolderHandle, HierarchyClient, ItemKind, PropertySource};

/// What to walk and how to recognise spreadsheets
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Server-relative path of the scan root
    pub root_path: String,
    /// Extension (with dot) of files that carry a sheet manifest
    pub spreadsheet_extension: String,
    pub property_names: PropertyNames,
}

impl ScanOptions {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            spreadsheet_extension: ".xlsx".to_string(),
            property_names: PropertyNames::default(),
        }
    }

    pub fn from_config(config: &crate::Config) -> Self {
        Self {
            root_path: config.root_path(),
            spreadsheet_extension: config.scan.spreadsheet_extension.clone(),
            property_names: PropertyNames::from(&config.scan),
        }
    }

    /// Case-sensitive suffix match on the file name
    pub fn is_spreadsheet(&self, name: &str) -> bool {
        name.ends_with(&self.spreadsheet_extension)
    }
}

enum FrontierEntry {
    Root(FolderHandle),
    Folder { path: String, handle: FolderHandle },
}

/// Traversal state for a single run
pub struct Traversal<'a, C: HierarchyClient + ?Sized, P: PropertySource + ?Sized> {
    client: &'a C,
    enricher: MetadataEnricher<'a, P>,
    options: ScanOptions,
    folders: Vec<FolderRecord>,
    files: Vec<FileRecord>,
    folder_ids: HashMap<String, i64>,
    next_folder_id: i64,
    next_file_id: i64,
    missing: MissingCounts,
}

impl<'a, C: HierarchyClient + ?Sized, P: PropertySource + ?Sized> Traversal<'a, C, P> {
    pub fn new(client: &'a C, properties: &'a P, options: ScanOptions) -> Self {
        Self {
            client,
            enricher: MetadataEnricher::new(properties, options.property_names.clone()),
            options,
            folders: Vec::new(),
            files: Vec::new(),
            folder_ids: HashMap::new(),
            next_folder_id: ROOT_FOLDER_ID + 1,
            next_file_id: 1,
            missing: MissingCounts::default(),
        }
    }

    /// Walk the whole tree and return the accumulated records.
    ///
    /// Any listing or metadata failure aborts the walk; nothing gathered so
    /// far is returned.
    pub async fn run(mut self) -> Result<ScanSnapshot> {
        let root_path = self.options.root_path.clone();
        let root = self.client.resolve_root(&root_path).await?;
        log::info!("Scanning from {}", root_path);

        self.record_folder(FolderRecord {
            id: ROOT_FOLDER_ID,
            parent_id: ROOT_PARENT_ID,
            name: ROOT_FOLDER_NAME.to_string(),
            path: root_path,
            description: None,
        })?;

        let mut frontier = VecDeque::from([FrontierEntry::Root(root)]);

        while let Some(entry) = frontier.pop_front() {
            let (folder_id, handle) = match entry {
                FrontierEntry::Root(handle) => (ROOT_FOLDER_ID, handle),
                FrontierEntry::Folder { path, handle } => (self.folder_id(&path)?, handle),
            };
            log::debug!("Visiting folder {} ({})", folder_id, handle.as_str());

            let listing = self.client.list_children(&handle).await?;

            let mut discovered = Vec::with_capacity(listing.folders.len());
            for sub in listing.folders {
                let description = self
                    .enricher
                    .fetch_description(ItemKind::Folder, &sub.path)
                    .await?;
                if description.is_none() {
                    self.missing.folders += 1;
                }

                let id = self.next_folder_id;
                self.next_folder_id += 1;
                self.record_folder(FolderRecord {
                    id,
                    parent_id: folder_id,
                    name: sub.name,
                    path: sub.path.clone(),
                    description,
                })?;
                discovered.push(FrontierEntry::Folder {
                    path: sub.path,
                    handle: sub.handle,
                });
            }

            // Children go ahead of queued siblings, keeping their own order.
            for child in discovered.into_iter().rev() {
                frontier.push_front(child);
            }

            for file in listing.files {
                let description = self
                    .enricher
                    .fetch_description(ItemKind::File, &file.path)
                    .await?;
                if description.is_none() {
                    self.missing.files += 1;
                }

                let sheet_manifest = if self.options.is_spreadsheet(&file.name) {
                    let manifest = self.enricher.fetch_sheet_manifest(&file.path).await?;
                    if manifest.is_none() {
                        self.missing.sheet_manifests += 1;
                    }
                    manifest
                } else {
                    None
                };

                let id = self.next_file_id;
                self.next_file_id += 1;
                self.files.push(FileRecord {
                    id,
                    folder_id,
                    name: file.name,
                    path: file.path,
                    description,
                    sheet_manifest,
                });
            }
        }

        log::info!(
            "Traversal complete: {} folders, {} files",
            self.folders.len(),
            self.files.len()
        );

        Ok(ScanSnapshot {
            folders: self.folders,
            files: self.files,
            missing: self.missing,
        })
    }

    fn record_folder(&mut self, record: FolderRecord) -> Result<()> {
        if self.folder_ids.insert(record.path.clone(), record.id).is_some() {
            return Err(SpmapError::Traversal(format!(
                "Folder path listed twice: {}",
                record.path
            )));
        }
        self.folders.push(record);
        Ok(())
    }

    fn folder_id(&self, path: &str) -> Result<i64> {
        self.folder_ids.get(path).copied().ok_or_else(|| {
            SpmapError::Traversal(format!("Folder visited before it was recorded: {}", path))
        })
    }
}
