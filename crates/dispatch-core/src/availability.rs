//! Resolves which service point a drone launches from at a given date/time.

use crate::models::{Availability, Coordinate, DayOfWeek, ServicePoint, ServicePointDrones};
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::HashMap;

/// A drone's windows at one service point.
#[derive(Debug, Clone)]
struct Stationing {
    service_point_id: u32,
    windows: Vec<Availability>,
}

/// Read-only lookup of drone stationings and service point locations.
///
/// Built once per planning call from the catalog collections. Stationings
/// keep catalog order so the first matching window always wins.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    stationings: HashMap<String, Vec<Stationing>>,
    locations: HashMap<u32, Coordinate>,
}

impl AvailabilityIndex {
    pub fn new(service_points: &[ServicePoint], service_point_drones: &[ServicePointDrones]) -> Self {
        let mut locations = HashMap::new();
        for point in service_points {
            locations.entry(point.id).or_insert(point.location);
        }

        let mut stationings: HashMap<String, Vec<Stationing>> = HashMap::new();
        for binding in service_point_drones {
            for drone in &binding.drones {
                stationings
                    .entry(drone.id.clone())
                    .or_default()
                    .push(Stationing {
                        service_point_id: binding.service_point_id,
                        windows: drone.availability.clone(),
                    });
            }
        }

        Self {
            stationings,
            locations,
        }
    }

    /// Location of a service point, if the catalog knows it.
    pub fn location(&self, service_point_id: u32) -> Option<Coordinate> {
        self.locations.get(&service_point_id).copied()
    }

    /// Service point whose window strictly contains `time` on `date`'s weekday.
    pub fn find_service_point(&self, drone_id: &str, date: NaiveDate, time: NaiveTime) -> Option<u32> {
        let day = DayOfWeek::from(date.weekday());
        self.stationings
            .get(drone_id)?
            .iter()
            .find(|stationing| stationing.windows.iter().any(|w| w.covers(day, time)))
            .map(|stationing| stationing.service_point_id)
    }

    /// Base coordinate of the drone for a request at `date`/`time`.
    ///
    /// The first matching window decides; if its service point is missing
    /// from the catalog the drone is treated as unavailable.
    pub fn find_base(&self, drone_id: &str, date: NaiveDate, time: NaiveTime) -> Option<Coordinate> {
        let service_point_id = self.find_service_point(drone_id, date, time)?;
        let location = self.location(service_point_id);
        if location.is_none() {
            tracing::warn!(
                "drone {} is bound to unknown service point {}",
                drone_id,
                service_point_id
            );
        }
        location
    }

    pub fn is_available(&self, drone_id: &str, date: NaiveDate, time: NaiveTime) -> bool {
        self.find_base(drone_id, date, time).is_some()
    }
}

/// One-shot lookup without building an index first.
pub fn find_base(
    drone_id: &str,
    date: NaiveDate,
    time: NaiveTime,
    service_points: &[ServicePoint],
    service_point_drones: &[ServicePointDrones],
) -> Option<Coordinate> {
    AvailabilityIndex::new(service_points, service_point_drones).find_base(drone_id, date, time)
}
