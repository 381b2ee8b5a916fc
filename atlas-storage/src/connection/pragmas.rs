//! SQLite pragma setup for write and read connections.

use atlas_core::errors::StorageError;
use rusqlite::Connection;

/// Apply pragmas for the write connection: WAL for parallel readers,
/// NORMAL synchronous (safe with WAL), and a busy timeout so concurrent
/// workers wait instead of failing with SQLITE_BUSY.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )
    .map_err(|e| StorageError::SqliteError {
        message: e.to_string(),
    })
}

/// Apply pragmas for read-only pool connections.
pub fn apply_read_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "PRAGMA query_only=ON;
         PRAGMA busy_timeout=5000;",
    )
    .map_err(|e| StorageError::SqliteError {
        message: e.to_string(),
    })
}
