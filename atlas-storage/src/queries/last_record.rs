//! last_record table queries — freshest attributable observation per unit.

use atlas_core::errors::StorageError;
use rusqlite::{params, Connection};

/// A last-record row.
#[derive(Debug, Clone, PartialEq)]
pub struct LastRecord {
    pub unit_key: String,
    pub record_id: String,
    pub event_date: String,
    pub weight: f64,
    pub age_weeks: i64,
    pub assessed_date: String,
}

/// Replace the table wholesale; it is rebuilt per compile run.
pub fn replace_all(conn: &Connection, rows: &[LastRecord]) -> Result<usize, StorageError> {
    conn.execute("DELETE FROM last_record", [])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO last_record
             (unit_key, record_id, event_date, weight, age_weeks, assessed_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut count = 0;
    for row in rows {
        stmt.execute(params![
            row.unit_key,
            row.record_id,
            row.event_date,
            row.weight,
            row.age_weeks,
            row.assessed_date,
        ])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        count += 1;
    }
    Ok(count)
}

/// Get one unit's last record.
pub fn get(conn: &Connection, unit_key: &str) -> Result<Option<LastRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, record_id, event_date, weight, age_weeks, assessed_date
             FROM last_record WHERE unit_key = ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut rows = stmt
        .query_map(params![unit_key], |row| {
            Ok(LastRecord {
                unit_key: row.get(0)?,
                record_id: row.get(1)?,
                event_date: row.get(2)?,
                weight: row.get(3)?,
                age_weeks: row.get(4)?,
                assessed_date: row.get(5)?,
            })
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    match rows.next() {
        Some(row) => Ok(Some(
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?,
        )),
        None => Ok(None),
    }
}

/// Count last-record rows.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM last_record", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
