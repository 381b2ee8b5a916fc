//! grid_units table queries — the read-only reference grid.

use atlas_core::errors::StorageError;
use atlas_core::types::{BoundingBox, Point, Polygon};
use rusqlite::{params, Connection};

/// A reference grid tile with its parsed geometry.
#[derive(Debug, Clone)]
pub struct GridUnit {
    pub unit_key: String,
    pub polygon: Polygon,
    pub centroid: Point,
}

/// Insert a batch of grid tiles. Centroid and bounding box are derived from
/// the polygon at insert time so spatial prefilters stay in SQL.
pub fn insert_batch(
    conn: &Connection,
    tiles: &[(String, Polygon)],
) -> Result<usize, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT OR REPLACE INTO grid_units
             (unit_key, geometry_json, centroid_x, centroid_y, min_x, min_y, max_x, max_y)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut count = 0;
    for (unit_key, polygon) in tiles {
        let centroid = polygon.centroid();
        let bbox = polygon.bounding_box();
        stmt.execute(params![
            unit_key,
            polygon.to_json(),
            centroid.x,
            centroid.y,
            bbox.min_x,
            bbox.min_y,
            bbox.max_x,
            bbox.max_y,
        ])
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        count += 1;
    }
    Ok(count)
}

fn row_to_grid_unit(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, f64, f64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn parse_grid_unit(
    (unit_key, geometry_json, cx, cy): (String, String, f64, f64),
) -> Result<GridUnit, StorageError> {
    let polygon =
        Polygon::from_json(&geometry_json).ok_or_else(|| StorageError::InvalidValue {
            table: "grid_units".to_string(),
            message: format!("unparseable geometry for {unit_key}"),
        })?;
    Ok(GridUnit {
        unit_key,
        polygon,
        centroid: Point::new(cx, cy),
    })
}

/// Get all grid tiles whose bounding box intersects the given box.
/// Exact polygon intersection is the caller's job; this is the prefilter.
pub fn intersecting_bbox(
    conn: &Connection,
    bbox: &BoundingBox,
) -> Result<Vec<GridUnit>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, geometry_json, centroid_x, centroid_y
             FROM grid_units
             WHERE min_x <= ?1 AND max_x >= ?2 AND min_y <= ?3 AND max_y >= ?4",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let rows = stmt
        .query_map(
            params![bbox.max_x, bbox.min_x, bbox.max_y, bbox.min_y],
            row_to_grid_unit,
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut result = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        result.push(parse_grid_unit(raw)?);
    }
    Ok(result)
}

/// Get one grid tile by key.
pub fn get(conn: &Connection, unit_key: &str) -> Result<Option<GridUnit>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, geometry_json, centroid_x, centroid_y
             FROM grid_units WHERE unit_key = ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut rows = stmt
        .query_map(params![unit_key], row_to_grid_unit)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    match rows.next() {
        Some(row) => {
            let raw =
                row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
            Ok(Some(parse_grid_unit(raw)?))
        }
        None => Ok(None),
    }
}

/// Count grid tiles.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM grid_units", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
