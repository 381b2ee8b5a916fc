//! simplified_results table — binary present/absent export of compiled codes.

use atlas_core::errors::StorageError;
use atlas_core::types::{EvidenceCategory, PeriodIndex};
use rusqlite::{params, Connection};

/// Rebuild the simplified view: for every evidence row with an assigned code,
/// `present = 1` where the code is in `present_codes`, NULL otherwise.
pub fn rebuild(
    conn: &Connection,
    present_codes: &[i64],
) -> Result<usize, StorageError> {
    conn.execute("DELETE FROM simplified_results", [])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let list = present_codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",");

    conn.execute(
        &format!(
            "INSERT INTO simplified_results (unit_key, category, period, present)
             SELECT unit_key, category, period,
                    CASE WHEN presence_code IN ({list}) THEN 1 ELSE NULL END
             FROM evidence
             WHERE presence_code IS NOT NULL"
        ),
        [],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Read the simplified flag for one (unit, category, period).
pub fn get(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
) -> Result<Option<bool>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT present FROM simplified_results
             WHERE unit_key = ?1 AND category = ?2 AND period = ?3",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut rows = stmt
        .query_map(
            params![unit_key, category.as_str(), period as i64],
            |row| row.get::<_, Option<i64>>(0),
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    match rows.next() {
        Some(row) => {
            let value =
                row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
            Ok(Some(value == Some(1)))
        }
        None => Ok(None),
    }
}

/// Count simplified rows.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM simplified_results", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
