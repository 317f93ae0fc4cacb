//! Persistence backends
//!
//! `SqlitePersistence` keeps each blob as one row of a key/value table and uses
//! an r2d2 connection pool so readers never wait on a mutex. `MemoryPersistence`
//! is a process-local map for tests and embedders that persist elsewhere.

use crate::interface::{PersistError, Persistence};
use parking_lot::Mutex;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl From<DatabaseError> for PersistError {
    fn from(e: DatabaseError) -> Self {
        PersistError::Unavailable(e.to_string())
    }
}

/// Thread-safe SQLite blob store using connection pooling
pub struct SqlitePersistence {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlitePersistence {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| {
                conn.execute_batch("
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                ")?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(4)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory();

        // In-memory needs single connection to maintain state
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updatedAt TEXT NOT NULL
            );
        "#)?;
        Ok(())
    }

    pub fn put(&self, key: &str, value: &[u8]) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.f").to_string();
        conn.execute(
            "INSERT INTO blobs (key, value, updatedAt) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updatedAt = excluded.updatedAt",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> DatabaseResult<Option<Vec<u8>>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }
}

impl Persistence for SqlitePersistence {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        Ok(self.put(key, blob)?)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.get(key)?)
    }
}

/// In-process blob store
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(key).cloned()
    }
}

impl Persistence for MemoryPersistence {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        self.blobs.lock().insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_put_get() {
        let db = SqlitePersistence::open_in_memory().unwrap();
        assert_eq!(db.get("missing").unwrap(), None);

        db.put("k", b"first").unwrap();
        db.put("k", b"second").unwrap();
        assert_eq!(db.get("k").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_sqlite_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let db = SqlitePersistence::open(&path).unwrap();
            db.save("ClipboardItems", b"[]").unwrap();
        }

        let db = SqlitePersistence::open(&path).unwrap();
        assert_eq!(db.load("ClipboardItems").unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn test_memory_persistence() {
        let store = MemoryPersistence::new();
        assert_eq!(store.load("k").unwrap(), None);
        store.save("k", &[1, 2, 3]).unwrap();
        assert_eq!(store.load("k").unwrap(), Some(vec![1, 2, 3]));
    }
}
