//! observations table queries — occurrence records with footprints.

use atlas_core::errors::StorageError;
use atlas_core::types::{ObservationRecord, Polygon};
use rusqlite::{params, Connection};

/// Insert a batch of observation records. Duplicate record ids are ignored;
/// the first-loaded source takes precedence.
pub fn insert_batch(
    conn: &Connection,
    records: &[ObservationRecord],
) -> Result<usize, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO observations
             (record_id, event_date, event_year, event_month, weight, weight_notes,
              footprint_json, footprint_area, min_x, min_y, max_x, max_y)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut count = 0;
    for record in records {
        let bbox = record.footprint.bounding_box();
        let inserted = stmt
            .execute(params![
                record.record_id,
                record.event_date,
                record.event_year,
                record.event_month as i64,
                record.weight,
                record.weight_notes,
                record.footprint.to_json(),
                record.footprint_area(),
                bbox.min_x,
                bbox.min_y,
                bbox.max_x,
                bbox.max_y,
            ])
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        count += inserted;
    }
    Ok(count)
}

/// Delete observations outside the configured year range and month set.
/// Applied once after loading; aggregation then only sees admissible records.
pub fn prune_outside_window(
    conn: &Connection,
    min_year: i32,
    max_year: i32,
    months: &[u8],
) -> Result<usize, StorageError> {
    let mut removed = conn
        .execute(
            "DELETE FROM observations WHERE event_year < ?1 OR event_year > ?2",
            params![min_year, max_year],
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    if !months.is_empty() {
        let list = months
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(",");
        removed += conn
            .execute(
                &format!("DELETE FROM observations WHERE event_month NOT IN ({list})"),
                [],
            )
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    }
    Ok(removed)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(ObservationRecord, String)> {
    let footprint_json: String = row.get(6)?;
    Ok((
        ObservationRecord {
            record_id: row.get(0)?,
            event_date: row.get(1)?,
            event_year: row.get(2)?,
            event_month: row.get::<_, i64>(3)? as u8,
            weight: row.get(4)?,
            weight_notes: row.get(5)?,
            // Placeholder ring, replaced after JSON parse below.
            footprint: Polygon {
                exterior: Vec::new(),
            },
        },
        footprint_json,
    ))
}

fn finish_record(
    (mut record, footprint_json): (ObservationRecord, String),
) -> Result<ObservationRecord, StorageError> {
    record.footprint =
        Polygon::from_json(&footprint_json).ok_or_else(|| StorageError::InvalidValue {
            table: "observations".to_string(),
            message: format!("unparseable footprint for {}", record.record_id),
        })?;
    Ok(record)
}

const SELECT_COLUMNS: &str = "record_id, event_date, event_year, event_month, weight,
                              weight_notes, footprint_json";

/// Get observations whose event year falls in the inclusive range.
pub fn in_year_range(
    conn: &Connection,
    min_year: Option<i32>,
    max_year: Option<i32>,
) -> Result<Vec<ObservationRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM observations
             WHERE (?1 IS NULL OR event_year >= ?1)
               AND (?2 IS NULL OR event_year <= ?2)
             ORDER BY record_id"
        ))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![min_year, max_year], row_to_record)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        result.push(finish_record(raw)?);
    }
    Ok(result)
}

/// Count observation rows.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
