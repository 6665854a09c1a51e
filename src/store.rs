//! Persisted key/value state.
//!
//! Session state is a handful of string values under fixed keys. The
//! [`StateStore`] trait is the seam between the session and whatever keeps
//! those values: a SQLite file for the CLI, or a plain map in memory.

use crate::error::{Result, VocabError};
use log::{debug, error, info, warn};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Persisted key of the selected lesson identifier.
pub const KEY_LESSON_ID: &str = "lessonId";
/// Persisted key of the study mode code.
pub const KEY_MODE: &str = "mode";
/// Persisted key of the show-examples flag.
pub const KEY_EXAMPLES: &str = "examples";
/// Persisted key of the learned-words mapping (JSON).
pub const KEY_LEARNT_WORDS: &str = "learntWords";

/// String key/value storage scoped to one learner.
pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

// --- In-memory store ---

/// Store that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// --- SQLite store ---

const CREATE_STATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

/// Store backed by a SQLite database file.
pub struct SqliteStore {
    conn: Connection,
}

// Opens/creates the database connection with the pragmas we rely on.
fn open_db_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )?;

    // journal_mode answers with the mode actually in effect
    let journal_mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!("SQLite journal mode: {}", journal_mode);
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    Ok(conn)
}

/// Creates the state table if it doesn't exist.
fn initialize_database(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_STATE_TABLE, [])?;
    Ok(())
}

impl SqliteStore {
    /// Opens (or creates) the state database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        info!("Using state database: {:?}", path);
        let conn = open_db_connection(path)?;
        initialize_database(&conn)?;
        Ok(SqliteStore { conn })
    }
}

impl StateStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(VocabError::from)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        debug!("Persisting state key '{}'", key);
        self.conn.execute(
            "INSERT INTO state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

// SQLite names the journal files by appending to the full file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Deletes a state database file along with its WAL and SHM siblings.
///
/// A missing file is not an error.
pub fn clear_database(path: &Path) -> Result<()> {
    if !path.exists() {
        info!("Database file not found, nothing to clear: {:?}", path);
        return Ok(());
    }

    match fs::remove_file(path) {
        Ok(_) => {
            info!("Successfully deleted database file: {:?}", path);
            for suffix in ["-wal", "-shm"] {
                let sibling = sibling_path(path, suffix);
                match fs::remove_file(&sibling) {
                    Ok(_) => debug!("Deleted {:?}", sibling),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to delete {:?}: {}", sibling, e),
                }
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to delete database file {:?}: {}", path, e);
            Err(VocabError::Io(e))
        }
    }
}
