//! legacy_range table queries — the one-time baseline feed.

use atlas_core::errors::StorageError;
use atlas_core::types::LegacyRecord;
use rusqlite::{params, Connection};

/// Replace the legacy baseline wholesale. The feed is one-time; a reload
/// replaces, never merges.
pub fn replace_all(
    conn: &Connection,
    records: &[LegacyRecord],
) -> Result<usize, StorageError> {
    conn.execute("DELETE FROM legacy_range", [])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO legacy_range (unit_key, presence, origin, reproduction, season)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut count = 0;
    for record in records {
        stmt.execute(params![
            record.unit_key,
            record.presence,
            record.origin,
            record.reproduction,
            record.season,
        ])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        count += 1;
    }
    Ok(count)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LegacyRecord> {
    Ok(LegacyRecord {
        unit_key: row.get(0)?,
        presence: row.get(1)?,
        origin: row.get(2)?,
        reproduction: row.get(3)?,
        season: row.get(4)?,
    })
}

/// Get all legacy baseline records.
pub fn all_records(conn: &Connection) -> Result<Vec<LegacyRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, presence, origin, reproduction, season FROM legacy_range",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map([], row_to_record)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?);
    }
    Ok(result)
}

/// Get the legacy record for one unit.
pub fn get(conn: &Connection, unit_key: &str) -> Result<Option<LegacyRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, presence, origin, reproduction, season
             FROM legacy_range WHERE unit_key = ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut rows = stmt
        .query_map(params![unit_key], row_to_record)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    match rows.next() {
        Some(row) => Ok(Some(
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?,
        )),
        None => Ok(None),
    }
}

/// Count legacy records.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM legacy_range", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
