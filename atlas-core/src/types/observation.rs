//! Occurrence observation records as consumed from the footprint source.

use serde::{Deserialize, Serialize};

use super::geometry::Polygon;

/// One occurrence record with its pre-computed spatial footprint.
///
/// Footprints arrive as convex polygons (buffered point locations); the
/// overlap computation relies on that convexity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Unique, stable record id from the upstream source.
    pub record_id: String,
    /// Event date, ISO-8601 (date portion is sufficient).
    pub event_date: String,
    pub event_year: i32,
    pub event_month: u8,
    /// Evidentiary weight contributed by this record.
    pub weight: f64,
    pub weight_notes: Option<String>,
    pub footprint: Polygon,
}

impl ObservationRecord {
    /// Footprint area in square meters.
    pub fn footprint_area(&self) -> f64 {
        self.footprint.area()
    }
}
