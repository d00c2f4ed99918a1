//! Core data models for the delivery dispatch engine.
//!
//! Field names follow the catalog service's camelCase wire format so the
//! collections it serves deserialize directly into these types.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::geometry;

/// Per-axis tolerance used by `Coordinate` equality.
const COORDINATE_EPSILON: f64 = 1e-12;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Validate longitude/latitude ranges.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(-180.0..=180.0).contains(&self.lng) {
            errors.push(format!("Longitude {} is outside [-180, 180]", self.lng));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            errors.push(format!("Latitude {} is outside [-90, 90]", self.lat));
        }
        errors
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        (self.lng - other.lng).abs() <= COORDINATE_EPSILON
            && (self.lat - other.lat).abs() <= COORDINATE_EPSILON
    }
}

/// A closed polygon: a delivery/query region or a no-fly zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Polygon vertices (closed ring - first == last)
    pub vertices: Vec<Coordinate>,
}

/// No-fly zones are plain regions on the wire.
pub type RestrictedArea = Region;

impl Region {
    pub fn new(name: impl Into<String>, vertices: Vec<Coordinate>) -> Self {
        Self {
            name: name.into(),
            id: None,
            vertices,
        }
    }

    /// Check if a point is inside this region (boundary counts as inside).
    pub fn contains(&self, point: Coordinate) -> bool {
        geometry::point_in_polygon(point, &self.vertices)
    }

    /// Validate region shape.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.vertices.len() < 4 {
            errors.push("Region must have at least 4 vertices".to_string());
        }

        if let (Some(first), Some(last)) = (self.vertices.first(), self.vertices.last()) {
            if first.lng != last.lng || first.lat != last.lat {
                errors.push("Region must be closed (first vertex must equal last)".to_string());
            }
        }

        for vertex in &self.vertices {
            errors.extend(vertex.validate());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// What a drone can carry and what it costs to fly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    #[serde(default)]
    pub cooling: bool,
    #[serde(default)]
    pub heating: bool,
    pub capacity: f64,
    /// Move budget for a single flight
    pub max_moves: u32,
    pub cost_per_move: f64,
    pub cost_initial: f64,
    pub cost_final: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub capability: Capability,
}

/// Day of week as served by the catalog ("MONDAY", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// A weekly availability window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub day_of_week: DayOfWeek,
    #[serde(with = "clock_time")]
    pub from: NaiveTime,
    #[serde(with = "clock_time")]
    pub until: NaiveTime,
}

impl Availability {
    /// True when `time` on `day` falls strictly inside this window.
    pub fn covers(&self, day: DayOfWeek, time: NaiveTime) -> bool {
        self.day_of_week == day && self.from < time && time < self.until
    }
}

/// A drone stationed at a service point, with its windows there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneAvailability {
    pub id: String,
    #[serde(default)]
    pub availability: Vec<Availability>,
}

/// Binds a service point to the drones stationed there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePointDrones {
    pub service_point_id: u32,
    #[serde(default)]
    pub drones: Vec<DroneAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePoint {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub location: Coordinate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub capacity: f64,
    #[serde(default)]
    pub cooling: Option<bool>,
    #[serde(default)]
    pub heating: Option<bool>,
    /// Ceiling on the average cost per delivery of the carrying flight
    #[serde(default)]
    pub max_cost: Option<f64>,
}

impl Requirements {
    pub fn needs_cooling(&self) -> bool {
        self.cooling.unwrap_or(false)
    }

    pub fn needs_heating(&self) -> bool {
        self.heating.unwrap_or(false)
    }
}

/// A medicine dispatch request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub id: u32,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    pub requirements: Requirements,
    pub delivery: Coordinate,
}

/// One flight leg. `delivery_id == None` marks the return-to-base leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub delivery_id: Option<u32>,
    pub flight_path: Vec<Coordinate>,
}

impl Delivery {
    pub fn is_return_leg(&self) -> bool {
        self.delivery_id.is_none()
    }
}

/// Every leg flown by one drone, in flight order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DronePath {
    pub drone_id: String,
    pub deliveries: Vec<Delivery>,
}

impl DronePath {
    /// Split the legs into flights, each ending with its return leg.
    pub fn flights(&self) -> Vec<&[Delivery]> {
        let mut flights = Vec::new();
        let mut start = 0;
        for (idx, leg) in self.deliveries.iter().enumerate() {
            if leg.is_return_leg() {
                flights.push(&self.deliveries[start..=idx]);
                start = idx + 1;
            }
        }
        if start < self.deliveries.len() {
            flights.push(&self.deliveries[start..]);
        }
        flights
    }
}

/// The complete routing plan returned by the planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPlan {
    pub total_cost: f64,
    pub total_moves: u64,
    pub drone_paths: Vec<DronePath>,
}

impl FlightPlan {
    pub fn is_empty(&self) -> bool {
        self.drone_paths.is_empty()
    }

    pub fn drone_path(&self, drone_id: &str) -> Option<&DronePath> {
        self.drone_paths.iter().find(|path| path.drone_id == drone_id)
    }
}

/// The four catalog collections a planning call consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub drones: Vec<Drone>,
    #[serde(default)]
    pub service_points: Vec<ServicePoint>,
    #[serde(default)]
    pub restricted_areas: Vec<RestrictedArea>,
    #[serde(default)]
    pub service_point_drones: Vec<ServicePointDrones>,
}

/// Clock times arrive as "HH:MM" or "HH:MM:SS".
mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const WITH_SECONDS: &str = "%H:%M:%S";
    const WITHOUT_SECONDS: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(WITH_SECONDS).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, WITH_SECONDS)
            .or_else(|_| NaiveTime::parse_from_str(&raw, WITHOUT_SECONDS))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delivery_request_parses_short_clock_time() {
        let request: DeliveryRequest = serde_json::from_value(json!({
            "id": 7,
            "date": "2025-12-22",
            "time": "14:30",
            "requirements": { "capacity": 0.75, "cooling": true },
            "delivery": { "lng": -3.186, "lat": 55.944 }
        }))
        .expect("request should deserialize");

        assert_eq!(request.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert!(request.requirements.needs_cooling());
        assert!(!request.requirements.needs_heating());
        assert!(request.requirements.max_cost.is_none());
    }

    #[test]
    fn availability_window_is_strictly_interior() {
        let window: Availability = serde_json::from_value(json!({
            "dayOfWeek": "MONDAY",
            "from": "08:00:00",
            "until": "12:00:00"
        }))
        .unwrap();

        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert!(window.covers(DayOfWeek::Monday, at(9, 0)));
        assert!(!window.covers(DayOfWeek::Monday, at(8, 0)));
        assert!(!window.covers(DayOfWeek::Monday, at(12, 0)));
        assert!(!window.covers(DayOfWeek::Tuesday, at(9, 0)));
    }

    #[test]
    fn region_validation_reports_open_and_short_rings() {
        let open = Region::new(
            "open",
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(1.0, 0.0),
            ],
        );
        let errors = open.validate();
        assert_eq!(errors.len(), 1, "unexpected errors: {errors:?}");
        assert!(errors[0].contains("closed"));

        let short = Region::new("short", vec![Coordinate::new(0.0, 0.0); 3]);
        assert!(!short.is_valid());
    }

    #[test]
    fn flight_plan_serializes_return_leg_as_null() {
        let plan = FlightPlan {
            total_cost: 2.5,
            total_moves: 3,
            drone_paths: vec![DronePath {
                drone_id: "1".to_string(),
                deliveries: vec![Delivery {
                    delivery_id: None,
                    flight_path: vec![Coordinate::new(1.0, 2.0)],
                }],
            }],
        };

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["totalMoves"], 3);
        assert!(value["dronePaths"][0]["deliveries"][0]["deliveryId"].is_null());
        assert_eq!(value["dronePaths"][0]["deliveries"][0]["flightPath"][0]["lng"], 1.0);
    }

    #[test]
    fn drone_path_splits_into_flights() {
        let leg = |id: Option<u32>| Delivery {
            delivery_id: id,
            flight_path: Vec::new(),
        };
        let path = DronePath {
            drone_id: "1".to_string(),
            deliveries: vec![leg(Some(1)), leg(Some(2)), leg(None), leg(Some(3)), leg(None)],
        };

        let flights = path.flights();
        assert_eq!(flights.len(), 2);
        assert_eq!(flights[0].len(), 3);
        assert_eq!(flights[1].len(), 2);
    }
}
