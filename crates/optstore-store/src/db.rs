//! Database connection management

use crate::errors::{from_rusqlite, io_error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Default time a writer waits on a locked database
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Open a SQLite database at the given path, creating parent directories
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error("create_db_dir", e))?;
    }
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Apply connection pragmas
///
/// WAL lets readers proceed while an upsert transaction holds the write
/// lock; the busy timeout makes competing writers wait instead of failing.
pub fn configure(conn: &Connection, busy_timeout_ms: u64) -> Result<()> {
    // First, so the pragmas below also wait on a busy database
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
        .map_err(from_rusqlite)?;

    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(from_rusqlite)?;

    // journal_mode answers with the mode in effect ("memory" for in-memory dbs)
    let _mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(from_rusqlite)?;

    Ok(())
}
