//! Planar geometry in coordinate-degree space.
//!
//! Distances are Euclidean over (lng, lat) and always rounded to five
//! decimal places, so comparisons against the move length are stable.

use crate::error::{Error, Result};
use crate::models::Coordinate;
use crate::rules::UNIT_LENGTH;

/// Tolerance for colinearity and bounding-box containment checks.
const EPSILON: f64 = 1e-9;

/// Bearings must be a multiple of this many degrees.
pub const COMPASS_STEP_DEG: f64 = 22.5;

/// A polygon edge as (start, end).
pub type Edge = (Coordinate, Coordinate);

/// Round to five decimal places, ties to even.
pub fn round_to_five_places(value: f64) -> f64 {
    (value * 1e5).round_ties_even() / 1e5
}

/// Euclidean distance between two coordinates, rounded to five places.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lng = b.lng - a.lng;
    let d_lat = b.lat - a.lat;
    round_to_five_places((d_lng * d_lng + d_lat * d_lat).sqrt())
}

/// Two coordinates are close when they are less than one move apart.
pub fn is_close_to(a: Coordinate, b: Coordinate) -> bool {
    distance(a, b) < UNIT_LENGTH
}

/// Position after one move from `start` at `angle_deg` (0 = east, counter-clockwise).
pub fn next_position(start: Coordinate, angle_deg: f64) -> Result<Coordinate> {
    let on_compass = angle_deg % COMPASS_STEP_DEG == 0.0;
    if !on_compass || !(0.0..360.0).contains(&angle_deg) {
        return Err(Error::InvalidBearing { angle: angle_deg });
    }
    Ok(offset(start, angle_deg, UNIT_LENGTH))
}

/// Displace `start` by `length` along `angle_deg`.
pub(crate) fn offset(start: Coordinate, angle_deg: f64, length: f64) -> Coordinate {
    let angle = angle_deg.to_radians();
    Coordinate {
        lng: start.lng + length * angle.cos(),
        lat: start.lat + length * angle.sin(),
    }
}

/// Consecutive-vertex edges, including the closing edge back to vertex 0.
pub fn region_edges(vertices: &[Coordinate]) -> Vec<Edge> {
    let n = vertices.len();
    (0..n)
        .map(|i| (vertices[i], vertices[(i + 1) % n]))
        .collect()
}

fn within(a: f64, b: f64, value: f64) -> bool {
    a.min(b) - EPSILON <= value && value <= a.max(b) + EPSILON
}

/// Check if a point lies on an edge: colinear and inside its bounding box.
pub fn point_on_edge(point: Coordinate, edge: &Edge) -> bool {
    let (a, b) = edge;
    let cross = (b.lat - a.lat) * (point.lng - a.lng) - (point.lat - a.lat) * (b.lng - a.lng);
    if cross.abs() > EPSILON {
        return false;
    }
    a.lat.min(b.lat) <= point.lat
        && point.lat <= a.lat.max(b.lat)
        && a.lng.min(b.lng) <= point.lng
        && point.lng <= a.lng.max(b.lng)
}

/// Check if the ray cast from `point` towards +lng crosses an edge.
pub fn ray_intersects_edge(point: Coordinate, edge: &Edge) -> bool {
    let (a, b) = edge;

    // Horizontal edges never count, nor do edges wholly left of the point.
    if a.lat == b.lat || a.lng.max(b.lng) <= point.lng {
        return false;
    }
    if point.lat < a.lat.min(b.lat) || point.lat > a.lat.max(b.lat) {
        return false;
    }
    if a.lng == b.lng {
        return true;
    }

    let slope = (b.lat - a.lat) / (b.lng - a.lng);
    let crossing_lng = (point.lat - a.lat) / slope + a.lng;
    point.lng < crossing_lng
}

/// Ray-casting parity test over precomputed edges. Boundary counts as inside.
pub fn point_within_edges(point: Coordinate, edges: &[Edge]) -> bool {
    let mut crossings = 0usize;
    for edge in edges {
        if point_on_edge(point, edge) {
            return true;
        }
        if ray_intersects_edge(point, edge) {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}

/// Check if a point is inside a closed polygon (boundary counts as inside).
pub fn point_in_polygon(point: Coordinate, vertices: &[Coordinate]) -> bool {
    point_within_edges(point, &region_edges(vertices))
}

/// Check if segment p1-p2 intersects segment q1-q2, touching included.
pub fn segments_intersect(p1: Coordinate, p2: Coordinate, q1: Coordinate, q2: Coordinate) -> bool {
    fn orient(p: Coordinate, q: Coordinate, r: Coordinate) -> f64 {
        (q.lng - p.lng) * (r.lat - p.lat) - (q.lat - p.lat) * (r.lng - p.lng)
    }

    fn on_segment(p: Coordinate, q: Coordinate, r: Coordinate) -> bool {
        within(p.lng, q.lng, r.lng) && within(p.lat, q.lat, r.lat)
    }

    let o1 = orient(p1, p2, q1);
    let o2 = orient(p1, p2, q2);
    let o3 = orient(q1, q2, p1);
    let o4 = orient(q1, q2, p2);

    if o1.abs() <= EPSILON && on_segment(p1, p2, q1) {
        return true;
    }
    if o2.abs() <= EPSILON && on_segment(p1, p2, q2) {
        return true;
    }
    if o3.abs() <= EPSILON && on_segment(q1, q2, p1) {
        return true;
    }
    if o4.abs() <= EPSILON && on_segment(q1, q2, p2) {
        return true;
    }

    let p_crosses = (o1 > EPSILON && o2 < -EPSILON) || (o1 < -EPSILON && o2 > EPSILON);
    let q_crosses = (o3 > EPSILON && o4 < -EPSILON) || (o3 < -EPSILON && o4 > EPSILON);
    p_crosses && q_crosses
}

/// Check if segment a-b touches or crosses any of the given edges.
pub fn segment_crosses_edges(a: Coordinate, b: Coordinate, edges: &[Edge]) -> bool {
    edges
        .iter()
        .any(|(start, end)| segments_intersect(a, b, *start, *end))
}
