//! Versioned schema migrations, gated on `PRAGMA user_version`.

pub mod v001_initial;
pub mod v002_evidence;
pub mod v003_last_record;

use atlas_core::errors::StorageError;
use rusqlite::Connection;

const MIGRATIONS: &[(u32, &str)] = &[
    (1, v001_initial::MIGRATION_SQL),
    (2, v002_evidence::MIGRATION_SQL),
    (3, v003_last_record::MIGRATION_SQL),
];

/// Run all pending migrations. Each migration executes in its own
/// transaction and bumps `user_version` on success.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;

    for &(version, sql) in MIGRATIONS {
        if version <= current {
            continue;
        }
        let script = format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        );
        conn.execute_batch(&script)
            .map_err(|e| StorageError::MigrationFailed {
                version,
                message: e.to_string(),
            })?;
    }
    Ok(())
}

/// The schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|&(v, _)| v).unwrap_or(0)
}
