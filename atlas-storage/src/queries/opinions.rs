//! opinions / adjusted_opinions table queries.

use atlas_core::errors::StorageError;
use atlas_core::types::{AdjustedOpinion, EvidenceCategory, Opinion, OpinionStatus};
use rusqlite::{params, Connection};

fn parse_category(table: &str, value: &str) -> Result<EvidenceCategory, StorageError> {
    EvidenceCategory::parse(value).ok_or_else(|| StorageError::InvalidValue {
        table: table.to_string(),
        message: format!("unknown category {value:?}"),
    })
}

fn parse_status(table: &str, value: &str) -> Result<OpinionStatus, StorageError> {
    OpinionStatus::parse(value).ok_or_else(|| StorageError::InvalidValue {
        table: table.to_string(),
        message: format!("unknown status {value:?}"),
    })
}

/// Insert a batch of raw opinion records.
pub fn insert_batch(conn: &Connection, records: &[Opinion]) -> Result<usize, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO opinions
             (unit_key, year, category, expert, status, expert_rank, confidence,
              justification, entry_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut count = 0;
    for record in records {
        stmt.execute(params![
            record.unit_key,
            record.year,
            record.category.as_str(),
            record.expert,
            record.status.as_str(),
            record.rank,
            record.confidence,
            record.justification,
            record.entry_time,
        ])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        count += 1;
    }
    Ok(count)
}

/// Get all raw opinions with years in the inclusive span.
pub fn raw_in_span(
    conn: &Connection,
    min_year: i32,
    max_year: i32,
) -> Result<Vec<Opinion>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, year, category, expert, status, expert_rank, confidence,
                    justification, entry_time
             FROM opinions
             WHERE year BETWEEN ?1 AND ?2
             ORDER BY id",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![min_year, max_year], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, String>(8)?,
            ))
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        let (unit_key, year, category, expert, status, rank, confidence, justification, entry_time) =
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        result.push(Opinion {
            category: parse_category("opinions", &category)?,
            status: parse_status("opinions", &status)?,
            unit_key,
            year,
            expert,
            rank,
            confidence,
            justification,
            entry_time,
        });
    }
    Ok(result)
}

/// Replace the reconciled table for the inclusive year span, then insert the
/// new records. Prior content for the span is dropped wholesale.
pub fn replace_adjusted_span(
    conn: &Connection,
    min_year: i32,
    max_year: i32,
    records: &[AdjustedOpinion],
) -> Result<usize, StorageError> {
    conn.execute(
        "DELETE FROM adjusted_opinions WHERE year BETWEEN ?1 AND ?2",
        params![min_year, max_year],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT OR REPLACE INTO adjusted_opinions
             (unit_key, year, category, status, weight)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut count = 0;
    for record in records {
        stmt.execute(params![
            record.unit_key,
            record.year,
            record.category.as_str(),
            record.status.as_str(),
            record.weight,
        ])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        count += 1;
    }
    Ok(count)
}

/// Get all reconciled opinions for a category.
pub fn adjusted_for_category(
    conn: &Connection,
    category: EvidenceCategory,
) -> Result<Vec<AdjustedOpinion>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, year, status, weight FROM adjusted_opinions
             WHERE category = ?1 ORDER BY unit_key, year",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![category.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        let (unit_key, year, status, weight) =
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        result.push(AdjustedOpinion {
            status: parse_status("adjusted_opinions", &status)?,
            unit_key,
            year,
            category,
            weight,
        });
    }
    Ok(result)
}

/// The most recent reconciled opinion per unit for a category within an
/// inclusive year window: the per-period opinion projection.
pub fn latest_adjusted_in_window(
    conn: &Connection,
    category: EvidenceCategory,
    min_year: i32,
    max_year: i32,
) -> Result<Vec<AdjustedOpinion>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT a.unit_key, a.year, a.status, a.weight
             FROM adjusted_opinions AS a
             JOIN (SELECT unit_key, MAX(year) AS max_year
                   FROM adjusted_opinions
                   WHERE category = ?1 AND year BETWEEN ?2 AND ?3
                   GROUP BY unit_key) AS latest
               ON latest.unit_key = a.unit_key AND latest.max_year = a.year
             WHERE a.category = ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![category.as_str(), min_year, max_year], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        let (unit_key, year, status, weight) =
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        result.push(AdjustedOpinion {
            status: parse_status("adjusted_opinions", &status)?,
            unit_key,
            year,
            category,
            weight,
        });
    }
    Ok(result)
}

/// Count reconciled opinion rows.
pub fn adjusted_count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM adjusted_opinions", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
