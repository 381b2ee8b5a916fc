//! Evidence store errors.

/// Errors raised by the SQLite evidence store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Invalid stored value in {table}: {message}")]
    InvalidValue { table: String, message: String },

    #[error("Batch writer channel closed")]
    BatchChannelClosed,
}
