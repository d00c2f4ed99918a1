//! GeoJSON rendering of flight plans and restricted areas.

use crate::geometry::distance;
use crate::models::{Coordinate, DronePath, FlightPlan, Region};
use serde_json::{json, Value};

/// Flown coordinates of a drone path with consecutive repeats collapsed.
fn flown_coordinates(path: &DronePath) -> Vec<Coordinate> {
    let mut points: Vec<Coordinate> = Vec::new();
    for leg in &path.deliveries {
        for point in &leg.flight_path {
            if points.last() != Some(point) {
                points.push(*point);
            }
        }
    }
    points
}

fn positions(points: &[Coordinate]) -> Vec<[f64; 2]> {
    points.iter().map(|point| [point.lng, point.lat]).collect()
}

/// Every drone's route joined into one `LineString` geometry.
pub fn line_string(plan: &FlightPlan) -> Value {
    let mut coordinates: Vec<[f64; 2]> = Vec::new();
    for path in &plan.drone_paths {
        for position in positions(&flown_coordinates(path)) {
            if coordinates.last() != Some(&position) {
                coordinates.push(position);
            }
        }
    }
    json!({
        "type": "LineString",
        "coordinates": coordinates
    })
}

fn drone_feature(path: &DronePath) -> Value {
    let points = flown_coordinates(path);
    let total_distance: f64 = points.windows(2).map(|pair| distance(pair[0], pair[1])).sum();
    let delivery_ids: Vec<u32> = path
        .deliveries
        .iter()
        .filter_map(|leg| leg.delivery_id)
        .collect();

    json!({
        "type": "Feature",
        "properties": {
            "droneId": path.drone_id,
            "deliveryIds": delivery_ids,
            "totalMoves": points.len().saturating_sub(1),
            "totalDistance": total_distance
        },
        "geometry": {
            "type": "LineString",
            "coordinates": positions(&points)
        }
    })
}

/// One `LineString` feature per drone path.
pub fn feature_collection(plan: &FlightPlan) -> Value {
    let features: Vec<Value> = plan.drone_paths.iter().map(drone_feature).collect();
    json!({
        "type": "FeatureCollection",
        "features": features
    })
}

pub fn restricted_area_feature(region: &Region) -> Value {
    let mut ring = positions(&region.vertices);
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }

    json!({
        "type": "Feature",
        "properties": {
            "name": region.name,
            "id": region.id
        },
        "geometry": {
            "type": "Polygon",
            "coordinates": [ring]
        }
    })
}

/// Drone routes followed by the restricted areas they avoid.
pub fn overlay(plan: &FlightPlan, restricted_areas: &[Region]) -> Value {
    let features: Vec<Value> = plan
        .drone_paths
        .iter()
        .map(drone_feature)
        .chain(restricted_areas.iter().map(restricted_area_feature))
        .collect();
    json!({
        "type": "FeatureCollection",
        "features": features
    })
}
