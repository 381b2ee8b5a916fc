//! units table queries — spatial units referenced by any evidence source.

use atlas_core::errors::StorageError;
use atlas_core::types::Point;
use rusqlite::{params, Connection};

/// A spatial unit row. Geometry may be absent until the lazy grid fill runs.
#[derive(Debug, Clone)]
pub struct UnitRecord {
    pub unit_key: String,
    pub centroid: Option<Point>,
    pub has_geometry: bool,
}

/// Append a unit row if absent, pulling geometry from the reference grid
/// when the grid knows the key. Units are never deleted.
pub fn ensure_unit(conn: &Connection, unit_key: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR IGNORE INTO units (unit_key, geometry_json, centroid_x, centroid_y)
         SELECT ?1, g.geometry_json, g.centroid_x, g.centroid_y
         FROM (SELECT 1)
         LEFT JOIN grid_units AS g ON g.unit_key = ?1",
        params![unit_key],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Fill geometry for units that were created before their grid tile was
/// loaded. Mirrors the lazy-geometry contract of the data model.
pub fn fill_missing_geometries(conn: &Connection) -> Result<usize, StorageError> {
    conn.execute(
        "UPDATE units
         SET geometry_json = (SELECT g.geometry_json FROM grid_units AS g
                              WHERE g.unit_key = units.unit_key),
             centroid_x = (SELECT g.centroid_x FROM grid_units AS g
                           WHERE g.unit_key = units.unit_key),
             centroid_y = (SELECT g.centroid_y FROM grid_units AS g
                           WHERE g.unit_key = units.unit_key)
         WHERE geometry_json IS NULL
           AND unit_key IN (SELECT unit_key FROM grid_units)",
        [],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Get all unit rows.
pub fn all_units(conn: &Connection) -> Result<Vec<UnitRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, centroid_x, centroid_y, geometry_json IS NOT NULL
             FROM units",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map([], |row| {
            let cx: Option<f64> = row.get(1)?;
            let cy: Option<f64> = row.get(2)?;
            Ok(UnitRecord {
                unit_key: row.get(0)?,
                centroid: match (cx, cy) {
                    (Some(x), Some(y)) => Some(Point::new(x, y)),
                    _ => None,
                },
                has_geometry: row.get(3)?,
            })
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?);
    }
    Ok(result)
}

/// Centroids for the given unit keys, skipping units without geometry.
pub fn centroids_for(
    conn: &Connection,
    unit_keys: &[String],
) -> Result<Vec<(String, Point)>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT centroid_x, centroid_y FROM units
             WHERE unit_key = ?1 AND centroid_x IS NOT NULL",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::with_capacity(unit_keys.len());
    for key in unit_keys {
        let mut rows = stmt
            .query_map(params![key], |row| {
                Ok(Point::new(row.get(0)?, row.get(1)?))
            })
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        if let Some(row) = rows.next() {
            let point =
                row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
            result.push((key.clone(), point));
        }
    }
    Ok(result)
}

/// Count unit rows.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM units", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
