//! Read-side queries over a committed snapshot.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::{Result, SpmapError};
use crate::scan::{MissingCounts, ROOT_PARENT_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// A folder or file stored without a description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndocumentedEntry {
    pub kind: EntryKind,
    pub id: i64,
    pub name: String,
    pub rel_url: String,
}

/// Browser link for a stored `rel_url`, usable once signed in to the tenant.
pub fn browse_link(tenant_url: &str, rel_url: &str) -> String {
    format!(
        "{}/:t:/r/{}",
        tenant_url.trim_end_matches('/'),
        rel_url.trim_start_matches('/')
    )
}

/// Folders (root excluded) then files lacking a description, each by id.
pub fn undocumented(conn: &Connection) -> Result<Vec<UndocumentedEntry>> {
    let mut entries = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT folder_id, name, rel_url FROM folders \
         WHERE description IS NULL AND parent_id != ?1 ORDER BY folder_id",
    )?;
    let rows = stmt.query_map(params![ROOT_PARENT_ID], |row| {
        Ok(UndocumentedEntry {
            kind: EntryKind::Folder,
            id: row.get(0)?,
            name: row.get(1)?,
            rel_url: row.get(2)?,
        })
    })?;
    for row in rows {
        entries.push(row.map_err(SpmapError::Database)?);
    }

    let mut stmt = conn.prepare(
        "SELECT file_id, name, rel_url FROM files WHERE description IS NULL ORDER BY file_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(UndocumentedEntry {
            kind: EntryKind::File,
            id: row.get(0)?,
            name: row.get(1)?,
            rel_url: row.get(2)?,
        })
    })?;
    for row in rows {
        entries.push(row.map_err(SpmapError::Database)?);
    }

    Ok(entries)
}

/// Recompute the end-of-run counters from a finished store.
pub fn missing_counts(conn: &Connection, spreadsheet_extension: &str) -> Result<MissingCounts> {
    let files: i64 = conn.query_row(
        "SELECT COUNT(*) FROM files WHERE description IS NULL",
        [],
        |row| row.get(0),
    )?;
    let folders: i64 = conn.query_row(
        "SELECT COUNT(*) FROM folders WHERE description IS NULL AND parent_id != ?1",
        params![ROOT_PARENT_ID],
        |row| row.get(0),
    )?;
    // case-sensitive suffix, matching the traversal's gate
    let sheet_manifests: i64 = conn.query_row(
        "SELECT COUNT(*) FROM files WHERE excel_sheets IS NULL AND substr(name, -length(?1)) = ?1",
        params![spreadsheet_extension],
        |row| row.get(0),
    )?;

    Ok(MissingCounts {
        files: files as usize,
        folders: folders as usize,
        sheet_manifests: sheet_manifests as usize,
    })
}
