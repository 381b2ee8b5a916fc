//! compile_runs table queries — append-only log of pipeline runs.

use atlas_core::errors::StorageError;
use rusqlite::{params, Connection};

/// A compile run record.
#[derive(Debug, Clone)]
pub struct CompileRun {
    pub id: i64,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub categories: String,
    pub period_count: i64,
    pub status: String,
    pub stage_errors: Option<i64>,
    pub error: Option<String>,
}

/// Insert a run-start row, returning its id.
pub fn insert_run_start(
    conn: &Connection,
    started_at: i64,
    categories: &str,
    period_count: i64,
) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO compile_runs (started_at, categories, period_count, status)
         VALUES (?1, ?2, ?3, 'running')",
        params![started_at, categories, period_count],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(conn.last_insert_rowid())
}

/// Mark a run complete (or failed) with its stage error count.
pub fn update_run_complete(
    conn: &Connection,
    id: i64,
    completed_at: i64,
    status: &str,
    stage_errors: i64,
    error: Option<&str>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE compile_runs
         SET completed_at = ?2, status = ?3, stage_errors = ?4, error = ?5
         WHERE id = ?1",
        params![id, completed_at, status, stage_errors, error],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Query the most recent runs, newest first.
pub fn query_recent(conn: &Connection, limit: i64) -> Result<Vec<CompileRun>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, started_at, completed_at, categories, period_count, status,
                    stage_errors, error
             FROM compile_runs ORDER BY started_at DESC LIMIT ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(params![limit], |row| {
            Ok(CompileRun {
                id: row.get(0)?,
                started_at: row.get(1)?,
                completed_at: row.get(2)?,
                categories: row.get(3)?,
                period_count: row.get(4)?,
                status: row.get(5)?,
                stage_errors: row.get(6)?,
                error: row.get(7)?,
            })
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?);
    }
    Ok(result)
}

/// Count compile runs.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM compile_runs", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
