use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Durable key-value storage: one serialized blob per store key.
///
/// Methods take `&self` so one backend can be shared by every store in
/// the process (see [`SharedStorage`]).
pub trait Storage {
    /// Read a blob. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write (insert or replace) a blob
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// A storage backend shared by all stores of one process
pub type SharedStorage = Rc<dyn Storage>;

/// The SqliteStorage keeps every store blob in a single SQLite file.
pub struct SqliteStorage {
    conn: Connection,
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Open the database in the user's data directory:
    /// - Linux: ~/.local/share/nye-party/nye_party.db
    /// - macOS: ~/Library/Application Support/nye-party/nye_party.db
    /// - Windows: %APPDATA%\nye-party\nye_party.db
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_db_path()?;
        Self::open(&db_path)
    }

    /// Open or create the database at an explicit path
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        info!("Database opened at: {}", db_path.display());

        let storage = SqliteStorage {
            conn,
            db_path: db_path.to_path_buf(),
        };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Get the path where the database should be stored by default
    pub fn default_db_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(AppError::DataDir)?;

        path.push("nye-party");
        path.push("nye_party.db");
        Ok(path)
    }

    /// Create the key-value table if it doesn't exist
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// In-memory backend, used by tests in place of the SQLite file.
///
/// Reads and writes can be made to fail to simulate a broken backend or an
/// exhausted quota.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStorage {
    blobs: std::cell::RefCell<std::collections::HashMap<String, String>>,
    fail_reads: std::cell::Cell<bool>,
    fail_writes: std::cell::Cell<bool>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn backend_error(message: String) -> AppError {
        AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, message))
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.get() {
            return Err(Self::backend_error(format!("backend unavailable reading {key}")));
        }
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Self::backend_error(format!(
                "storage quota exceeded while writing {key}"
            )));
        }
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
