use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tokio::task;
use crate::error::{Result, SpmapError};

pub mod query;
pub mod schema;
pub mod writer;

// NORMAL sync is safe here: the snapshot lands in a single transaction.
// temp_store = MEMORY for faster temp operations.
const CONNECTION_PRAGMAS: &str = "PRAGMA synchronous = NORMAL; \
                                  PRAGMA temp_store = MEMORY;";

/// Output store connection wrapper
pub struct Db {
    path: PathBuf,
}

impl Db {
    /// Create a new database connection manager
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a closure with a database connection in a blocking task
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let mut conn = open(&path)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| SpmapError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(SpmapError::Database)?;
    conn.execute_batch(CONNECTION_PRAGMAS)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_db_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Db::new(&db_path);

        let result = db.with_connection(|conn| {
            conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", [])
                .map_err(SpmapError::Database)?;
            Ok(())
        }).await;

        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_pragmas_set() {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("test.db"));

        db.with_connection(|conn| {
            let temp_store: i32 = conn.query_row("PRAGMA temp_store", [], |row| row.get(0))?;
            // 2 = MEMORY
            assert_eq!(temp_store, 2);

            let synchronous: i32 = conn.query_row("PRAGMA synchronous", [], |row| row.get(0))?;
            // 1 = NORMAL
            assert_eq!(synchronous, 1);

            Ok::<(), SpmapError>(())
        }).await.unwrap();
    }

    #[tokio::test]
    async fn test_closure_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("test.db"));

        let result: Result<()> = db
            .with_connection(|_conn| Err(SpmapError::SchemaExists("folders".to_string())))
            .await;
        assert!(matches!(result, Err(SpmapError::SchemaExists(_))));
    }
}
