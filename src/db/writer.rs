use rusqlite::{params, Connection};
use crate::db::{schema, Db};
use crate::error::Result;
use crate::scan::{FileRecord, FolderRecord, ScanSnapshot};

/// Create the snapshot relations and insert every record in one transaction.
///
/// Folders go in first (the full set), then files, each in accumulation
/// order. Values are bound as parameters, so quotes and separators in names
/// or descriptions are stored verbatim.
pub fn write_records(
    conn: &mut Connection,
    folders: &[FolderRecord],
    files: &[FileRecord],
) -> Result<()> {
    let tx = conn.transaction()?;

    schema::create_schema(&tx)?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO folders (folder_id, parent_id, name, rel_url, description) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for folder in folders {
            stmt.execute(params![
                folder.id,
                folder.parent_id,
                folder.name,
                folder.path,
                folder.description,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO files (file_id, folder_id, name, rel_url, description, excel_sheets) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for file in files {
            stmt.execute(params![
                file.id,
                file.folder_id,
                file.name,
                file.path,
                file.description,
                file.sheet_manifest,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Persist a finished snapshot to the output store.
pub async fn write_snapshot(db: &Db, snapshot: &ScanSnapshot) -> Result<()> {
    let folders = snapshot.folders.clone();
    let files = snapshot.files.clone();
    let (folder_count, file_count) = (folders.len(), files.len());

    db.with_connection(move |conn| write_records(conn, &folders, &files))
        .await?;

    log::info!(
        "Committed {} folders and {} files to {}",
        folder_count,
        file_count,
        db.path().display()
    );
    Ok(())
}
