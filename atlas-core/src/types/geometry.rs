//! Planar geometry primitives for footprints and unit tiles.
//!
//! Coordinates are meters in an equal-area projection; all math is planar.
//! Polygons are simple rings without holes — unit tiles and observation
//! footprints are both delivered in that form.

use serde::{Deserialize, Serialize};

/// A point in projected planar meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in meters.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned bounding box, used to prefilter polygon intersection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

/// A simple polygon: one exterior ring, implicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
}

impl Polygon {
    /// Build a polygon from an exterior ring. A trailing point equal to the
    /// first is dropped; rings with fewer than 3 distinct points yield `None`.
    pub fn new(mut exterior: Vec<Point>) -> Option<Self> {
        if exterior.len() > 1 && exterior.first() == exterior.last() {
            exterior.pop();
        }
        if exterior.len() < 3 {
            return None;
        }
        Some(Self { exterior })
    }

    /// Signed area via the shoelace formula. Positive for counter-clockwise
    /// rings.
    pub fn signed_area(&self) -> f64 {
        let pts = &self.exterior;
        let n = pts.len();
        let mut sum = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            sum += pts[i].x * pts[j].y - pts[j].x * pts[i].y;
        }
        sum / 2.0
    }

    /// Absolute area in square meters.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Polygon centroid. Falls back to the vertex mean for degenerate rings
    /// with (near-)zero area.
    pub fn centroid(&self) -> Point {
        let pts = &self.exterior;
        let n = pts.len();
        let a = self.signed_area();
        if a.abs() < f64::EPSILON {
            let (sx, sy) = pts
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            return Point::new(sx / n as f64, sy / n as f64);
        }
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            let cross = pts[i].x * pts[j].y - pts[j].x * pts[i].y;
            cx += (pts[i].x + pts[j].x) * cross;
            cy += (pts[i].y + pts[j].y) * cross;
        }
        Point::new(cx / (6.0 * a), cy / (6.0 * a))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in &self.exterior {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        bbox
    }

    /// Serialize the ring as JSON (`[[x, y], ...]`) for storage.
    pub fn to_json(&self) -> String {
        let coords: Vec<[f64; 2]> = self.exterior.iter().map(|p| [p.x, p.y]).collect();
        serde_json::to_string(&coords).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse a ring serialized by [`Polygon::to_json`].
    pub fn from_json(json: &str) -> Option<Self> {
        let coords: Vec<[f64; 2]> = serde_json::from_str(json).ok()?;
        Polygon::new(coords.into_iter().map(|[x, y]| Point::new(x, y)).collect())
    }
}
