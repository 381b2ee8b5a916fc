//! Polygon overlap computation for footprint-vs-tile intersection.
//!
//! Clipping is Sutherland-Hodgman: the subject ring may be concave (real
//! tiles are), the clip ring must be convex. Observation footprints are
//! buffered points and therefore convex, so tiles are always clipped
//! against footprints, never the other way around.

use atlas_core::types::{Point, Polygon};

/// Cross product of (b - a) x (p - a); positive when `p` is left of a->b.
fn cross(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Intersection of segment (a, b) with the infinite line through (c, d).
fn line_intersection(a: Point, b: Point, c: Point, d: Point) -> Point {
    let a1 = b.y - a.y;
    let b1 = a.x - b.x;
    let c1 = a1 * a.x + b1 * a.y;
    let a2 = d.y - c.y;
    let b2 = c.x - d.x;
    let c2 = a2 * c.x + b2 * c.y;
    let det = a1 * b2 - a2 * b1;
    if det.abs() < f64::EPSILON {
        // Parallel; fall back to the segment midpoint to stay finite.
        return Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    }
    Point::new((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det)
}

/// Return a copy of the ring with counter-clockwise winding.
fn normalize_ccw(polygon: &Polygon) -> Vec<Point> {
    let mut ring = polygon.exterior.clone();
    if polygon.signed_area() < 0.0 {
        ring.reverse();
    }
    ring
}

/// Clip `subject` against convex `clip` (Sutherland-Hodgman).
/// Returns `None` when the intersection is empty or degenerate.
pub fn clip_to_convex(subject: &Polygon, clip: &Polygon) -> Option<Polygon> {
    let clip_ring = normalize_ccw(clip);
    let mut output = subject.exterior.clone();

    let n = clip_ring.len();
    for i in 0..n {
        if output.len() < 3 {
            return None;
        }
        let edge_start = clip_ring[i];
        let edge_end = clip_ring[(i + 1) % n];

        let input = std::mem::take(&mut output);
        let m = input.len();
        for j in 0..m {
            let current = input[j];
            let previous = input[(j + m - 1) % m];
            let current_inside = cross(edge_start, edge_end, current) >= 0.0;
            let previous_inside = cross(edge_start, edge_end, previous) >= 0.0;

            if current_inside {
                if !previous_inside {
                    output.push(line_intersection(previous, current, edge_start, edge_end));
                }
                output.push(current);
            } else if previous_inside {
                output.push(line_intersection(previous, current, edge_start, edge_end));
            }
        }
    }

    Polygon::new(output).filter(|p| p.area() > f64::EPSILON)
}

/// Fraction of `footprint`'s area that falls inside `unit`, in [0, 1].
/// Returns 0.0 for disjoint geometries or a zero-area footprint.
pub fn overlap_fraction(unit: &Polygon, footprint: &Polygon) -> f64 {
    let footprint_area = footprint.area();
    if footprint_area <= f64::EPSILON {
        return 0.0;
    }
    if !unit.bounding_box().intersects(&footprint.bounding_box()) {
        return 0.0;
    }
    match clip_to_convex(unit, footprint) {
        Some(fragment) => (fragment.area() / footprint_area).min(1.0),
        None => 0.0,
    }
}
