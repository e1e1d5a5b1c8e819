//! Scan pipeline: walk the remote tree, enrich each item, persist the snapshot.

mod enricher;
mod report;
mod traversal;

pub use enricher::{MetadataEnricher, PropertyNames};
pub use report::report_summary;
pub use traversal::{ScanOptions, Traversal};

use serde::Serialize;

use crate::db::{schema, writer, Db};
use crate::error::Result;
use crate::remote::{HierarchyClient, PropertySource};

/// Local id of the scan root
pub const ROOT_FOLDER_ID: i64 = 0;
/// Parent id carried only by the scan root
pub const ROOT_PARENT_ID: i64 = -1;
pub const ROOT_FOLDER_NAME: &str = "ROOT";

/// One folder of the snapshot. `path` is the identity key; `id` is a
/// surrogate valid only within the run that assigned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub path: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub folder_id: i64,
    pub name: String,
    pub path: String,
    pub description: Option<String>,
    /// Only ever set for spreadsheet files
    pub sheet_manifest: Option<String>,
}

/// Items that came back without their human-authored text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MissingCounts {
    pub files: usize,
    pub folders: usize,
    pub sheet_manifests: usize,
}

/// Everything one traversal produced, in accumulation order
#[derive(Debug, Clone, Default)]
pub struct ScanSnapshot {
    pub folders: Vec<FolderRecord>,
    pub files: Vec<FileRecord>,
    pub missing: MissingCounts,
}

/// Traverse the remote tree and commit it to a fresh output store.
///
/// The store is checked for existing `folders`/`files` relations before the
/// walk starts, so a stale store fails fast instead of after a long crawl.
/// Nothing is written unless the whole traversal succeeds.
pub async fn scan_to_store<C, P>(
    client: &C,
    properties: &P,
    options: ScanOptions,
    db: &Db,
) -> Result<ScanSnapshot>
where
    C: HierarchyClient + ?Sized,
    P: PropertySource + ?Sized,
{
    db.with_connection(|conn| schema::ensure_absent(conn)).await?;

    let snapshot = Traversal::new(client, properties, options).run().await?;

    writer::write_snapshot(db, &snapshot).await?;

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpmapError;
    use crate::remote::fake::FakeRemote;
    use tempfile::TempDir;

    fn tree() -> FakeRemote {
        let mut remote = FakeRemote::new("/sites/vr/Docs");
        let data = remote.folder("/sites/vr/Docs", "Data");
        remote.property(&data, "OData__x005f_ExtendedDescription", "Raw data");
        let sheet = remote.file(&data, "plots.xlsx");
        remote.property(&sheet, "Excelcontents", "Fig1; Fig2");
        remote.file("/sites/vr/Docs", "O'Brien notes.txt");
        remote
    }

    fn count(db_path: &std::path::Path, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(db_path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    fn table_count(db_path: &std::path::Path) -> i64 {
        let conn = rusqlite::Connection::open(db_path).unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('folders', 'files')",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_scan_to_store() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("file_struct.db");
        let db = Db::new(&db_path);
        let remote = tree();

        let snapshot = scan_to_store(&remote, &remote, ScanOptions::new("/sites/vr/Docs"), &db)
            .await
            .unwrap();

        assert_eq!(snapshot.folders.len(), 2);
        assert_eq!(snapshot.files.len(), 2);
        assert_eq!(snapshot.missing.files, 2);
        assert_eq!(snapshot.missing.folders, 0);
        assert_eq!(snapshot.missing.sheet_manifests, 0);
        assert_eq!(count(&db_path, "folders"), 2);
        assert_eq!(count(&db_path, "files"), 2);
    }

    #[tokio::test]
    async fn test_listing_failure_commits_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("file_struct.db");
        let db = Db::new(&db_path);
        let mut remote = tree();
        remote.fail_listing_at("/sites/vr/Docs/Data");

        let err = scan_to_store(&remote, &remote, ScanOptions::new("/sites/vr/Docs"), &db)
            .await
            .unwrap_err();
        assert!(matches!(err, SpmapError::Listing { .. }));

        assert_eq!(table_count(&db_path), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_commits_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("file_struct.db");
        let db = Db::new(&db_path);
        let mut remote = tree();
        remote.fail_properties_at("/sites/vr/Docs/Data/plots.xlsx");

        let err = scan_to_store(&remote, &remote, ScanOptions::new("/sites/vr/Docs"), &db)
            .await
            .unwrap_err();
        assert!(matches!(err, SpmapError::Metadata { .. }));
        assert_eq!(table_count(&db_path), 0);
    }

    #[tokio::test]
    async fn test_existing_store_fails_before_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("file_struct.db");
        let db = Db::new(&db_path);
        let remote = tree();

        scan_to_store(&remote, &remote, ScanOptions::new("/sites/vr/Docs"), &db)
            .await
            .unwrap();

        let second = tree();
        let err = scan_to_store(&second, &second, ScanOptions::new("/sites/vr/Docs"), &db)
            .await
            .unwrap_err();
        assert!(matches!(err, SpmapError::SchemaExists(_)));
        assert!(second.listed().is_empty());
        assert_eq!(count(&db_path, "folders"), 2);
    }
}
