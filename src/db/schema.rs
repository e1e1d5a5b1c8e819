use rusqlite::{params, Connection};
use crate::error::{Result, SpmapError};

pub const FOLDERS_TABLE: &str = "folders";
pub const FILES_TABLE: &str = "files";

/// Snapshot relations in creation order
const RELATIONS: [(&str, &str); 2] = [
    (
        FOLDERS_TABLE,
        "CREATE TABLE folders (
            folder_id INTEGER PRIMARY KEY,
            parent_id INTEGER,
            name TEXT,
            rel_url TEXT,
            description TEXT
        )",
    ),
    (
        FILES_TABLE,
        "CREATE TABLE files (
            file_id INTEGER PRIMARY KEY,
            folder_id INTEGER,
            name TEXT,
            rel_url TEXT,
            description TEXT,
            excel_sheets TEXT
        )",
    ),
];

/// Snapshot relations already present in the store
pub fn existing_relations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name IN (?1, ?2) ORDER BY name",
    )?;
    let names: Vec<String> = stmt
        .query_map(params![FOLDERS_TABLE, FILES_TABLE], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
        .map_err(SpmapError::Database)?;
    Ok(names)
}

/// Fail with `SchemaExists` if either snapshot relation is already there.
pub fn ensure_absent(conn: &Connection) -> Result<()> {
    let existing = existing_relations(conn)?;
    if !existing.is_empty() {
        return Err(SpmapError::SchemaExists(existing.join(", ")));
    }
    Ok(())
}

/// Create both snapshot relations.
///
/// Uses plain `CREATE TABLE` so a stale store is never appended to; run it
/// inside the write transaction to keep the snapshot all-or-nothing.
pub fn create_schema(conn: &Connection) -> Result<()> {
    ensure_absent(conn)?;
    for (name, ddl) in RELATIONS {
        conn.execute(ddl, [])?;
        log::debug!("Created relation {}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(conn: &Connection, table: &str) -> Vec<(String, String)> {
        conn.prepare(&format!("PRAGMA table_info({})", table))
            .unwrap()
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            .unwrap()
    }

    #[test]
    fn test_create_schema_columns() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        let folder_cols: Vec<_> = columns(&conn, "folders").into_iter().map(|c| c.0).collect();
        assert_eq!(folder_cols, vec!["folder_id", "parent_id", "name", "rel_url", "description"]);

        let file_cols = columns(&conn, "files");
        let names: Vec<_> = file_cols.iter().map(|c| c.0.as_str()).collect();
        assert_eq!(
            names,
            vec!["file_id", "folder_id", "name", "rel_url", "description", "excel_sheets"]
        );
        assert_eq!(file_cols[0].1, "INTEGER");
        assert_eq!(file_cols[5].1, "TEXT");
    }

    #[test]
    fn test_create_twice_fails() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        let err = create_schema(&conn).unwrap_err();
        match err {
            SpmapError::SchemaExists(names) => assert_eq!(names, "files, folders"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_stale_relation_detected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE files (x INTEGER)", []).unwrap();

        assert!(matches!(ensure_absent(&conn), Err(SpmapError::SchemaExists(ref n)) if n == "files"));
        assert!(create_schema(&conn).is_err());
        assert_eq!(existing_relations(&conn).unwrap(), vec!["files".to_string()]);
    }

    #[test]
    fn test_unrelated_tables_ignored() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE notes (x INTEGER)", []).unwrap();
        assert!(ensure_absent(&conn).is_ok());
    }
}
