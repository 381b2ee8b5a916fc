//! evidence table queries — the per-(unit, category, period) evidence map.

use atlas_core::errors::StorageError;
use atlas_core::types::{EvidenceCategory, OpinionStatus, PeriodIndex, PresenceCode};
use rusqlite::{params, Connection};

/// One evidence row: everything the compiler knows about a unit in a
/// category and period.
#[derive(Debug, Clone)]
pub struct EvidenceRow {
    pub unit_key: String,
    pub category: EvidenceCategory,
    pub period: PeriodIndex,
    pub recent_weight: Option<f64>,
    pub historical_weight: Option<f64>,
    pub documented: bool,
    pub previously_documented: bool,
    pub opinion_status: Option<OpinionStatus>,
    pub opinion_weight: Option<f64>,
    pub presence_code: Option<PresenceCode>,
    pub extralimital: bool,
}

/// Append an evidence row if absent (all evidence fields empty).
pub fn ensure_row(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR IGNORE INTO evidence (unit_key, category, period)
         VALUES (?1, ?2, ?3)",
        params![unit_key, category.as_str(), period as i64],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Set the recent-era summed weight and documented flag.
/// Overwrites any prior value; aggregation reruns are idempotent.
pub fn set_recent_weight(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
    weight: f64,
    documented: bool,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO evidence (unit_key, category, period, recent_weight, documented)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (unit_key, category, period)
         DO UPDATE SET recent_weight = ?4, documented = ?5",
        params![
            unit_key,
            category.as_str(),
            period as i64,
            weight,
            documented as i64
        ],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Set the historical-era summed weight and previously-documented flag.
pub fn set_historical_weight(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
    weight: f64,
    previously_documented: bool,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO evidence (unit_key, category, period, historical_weight,
                               previously_documented)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (unit_key, category, period)
         DO UPDATE SET historical_weight = ?4, previously_documented = ?5",
        params![
            unit_key,
            category.as_str(),
            period as i64,
            weight,
            previously_documented as i64
        ],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Project a reconciled opinion into the evidence row for a period.
pub fn set_opinion(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
    status: OpinionStatus,
    weight: f64,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO evidence (unit_key, category, period, opinion_status, opinion_weight)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (unit_key, category, period)
         DO UPDATE SET opinion_status = ?4, opinion_weight = ?5",
        params![
            unit_key,
            category.as_str(),
            period as i64,
            status.as_str(),
            weight
        ],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Set the assigned presence code.
pub fn set_code(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
    code: PresenceCode,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO evidence (unit_key, category, period, presence_code)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (unit_key, category, period)
         DO UPDATE SET presence_code = ?4",
        params![unit_key, category.as_str(), period as i64, code.as_i64()],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Clear every extralimital flag for a (category, period) ahead of a
/// recomputation.
pub fn clear_extralimital_for_period(
    conn: &Connection,
    category: EvidenceCategory,
    period: PeriodIndex,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE evidence SET extralimital = 0
         WHERE category = ?1 AND period = ?2 AND extralimital = 1",
        params![category.as_str(), period as i64],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Set the extralimital flag.
pub fn set_extralimital(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
    flag: bool,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE evidence SET extralimital = ?4
         WHERE unit_key = ?1 AND category = ?2 AND period = ?3",
        params![unit_key, category.as_str(), period as i64, flag as i64],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

fn row_to_evidence(
    category: EvidenceCategory,
) -> impl Fn(&rusqlite::Row<'_>) -> rusqlite::Result<EvidenceRow> {
    move |row| {
        let status: Option<String> = row.get(6)?;
        let code: Option<i64> = row.get(8)?;
        Ok(EvidenceRow {
            unit_key: row.get(0)?,
            category,
            period: row.get::<_, i64>(1)? as PeriodIndex,
            recent_weight: row.get(2)?,
            historical_weight: row.get(3)?,
            documented: row.get::<_, i64>(4)? != 0,
            previously_documented: row.get::<_, i64>(5)? != 0,
            opinion_status: status.as_deref().and_then(OpinionStatus::parse),
            opinion_weight: row.get(7)?,
            presence_code: code.and_then(PresenceCode::from_i64),
            extralimital: row.get::<_, i64>(9)? != 0,
        })
    }
}

const EVIDENCE_COLUMNS: &str = "unit_key, period, recent_weight, historical_weight,
                                documented, previously_documented, opinion_status,
                                opinion_weight, presence_code, extralimital";

/// Get all evidence rows for (category, period).
pub fn rows_for_period(
    conn: &Connection,
    category: EvidenceCategory,
    period: PeriodIndex,
) -> Result<Vec<EvidenceRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence
             WHERE category = ?1 AND period = ?2 ORDER BY unit_key"
        ))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(
            params![category.as_str(), period as i64],
            row_to_evidence(category),
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?);
    }
    Ok(result)
}

/// Get all evidence rows for a category across every period.
pub fn rows_for_category(
    conn: &Connection,
    category: EvidenceCategory,
) -> Result<Vec<EvidenceRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence
             WHERE category = ?1 ORDER BY unit_key, period"
        ))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![category.as_str()], row_to_evidence(category))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?);
    }
    Ok(result)
}

/// Get one evidence row.
pub fn get(
    conn: &Connection,
    unit_key: &str,
    category: EvidenceCategory,
    period: PeriodIndex,
) -> Result<Option<EvidenceRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence
             WHERE unit_key = ?1 AND category = ?2 AND period = ?3"
        ))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut rows = stmt
        .query_map(
            params![unit_key, category.as_str(), period as i64],
            row_to_evidence(category),
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    match rows.next() {
        Some(row) => Ok(Some(
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?,
        )),
        None => Ok(None),
    }
}

/// Per-unit count of periods with the documented flag set, for a category.
pub fn documented_period_counts(
    conn: &Connection,
    category: EvidenceCategory,
) -> Result<Vec<(String, i64)>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, SUM(documented) FROM evidence
             WHERE category = ?1 GROUP BY unit_key",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![category.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?);
    }
    Ok(result)
}

/// Unit keys flagged extralimital in any period of a category.
pub fn extralimital_units(
    conn: &Connection,
    category: EvidenceCategory,
) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT DISTINCT unit_key FROM evidence
             WHERE category = ?1 AND extralimital = 1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![category.as_str()], |row| row.get::<_, String>(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?);
    }
    Ok(result)
}

/// Count evidence rows.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM evidence", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
