//! Aggregates completed flights into the final plan.

use crate::models::{Delivery, DronePath, FlightPlan};
use chrono::NaiveDate;
use std::collections::HashMap;

/// A closed flight: delivery legs followed by the return-to-base leg.
#[derive(Debug, Clone)]
pub struct CompletedFlight {
    pub drone_id: String,
    pub date: NaiveDate,
    pub legs: Vec<Delivery>,
    pub moves: u64,
    pub cost: f64,
}

impl CompletedFlight {
    pub fn delivery_ids(&self) -> Vec<u32> {
        self.legs.iter().filter_map(|leg| leg.delivery_id).collect()
    }
}

/// Collects flights per drone and keeps running totals.
#[derive(Debug, Default)]
pub struct PlanAssembler {
    drone_paths: Vec<DronePath>,
    positions: HashMap<String, usize>,
    total_cost: f64,
    total_moves: u64,
    flights: usize,
}

impl PlanAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a flight's legs to its drone's path (creating it on first use).
    pub fn record_flight(&mut self, flight: CompletedFlight) {
        let position = match self.positions.get(&flight.drone_id) {
            Some(position) => *position,
            None => {
                self.drone_paths.push(DronePath {
                    drone_id: flight.drone_id.clone(),
                    deliveries: Vec::new(),
                });
                let position = self.drone_paths.len() - 1;
                self.positions.insert(flight.drone_id.clone(), position);
                position
            }
        };

        self.drone_paths[position].deliveries.extend(flight.legs);
        self.total_cost += flight.cost;
        self.total_moves += flight.moves;
        self.flights += 1;
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_moves(&self) -> u64 {
        self.total_moves
    }

    pub fn flight_count(&self) -> usize {
        self.flights
    }

    pub fn finish(self) -> FlightPlan {
        FlightPlan {
            total_cost: self.total_cost,
            total_moves: self.total_moves,
            drone_paths: self.drone_paths,
        }
    }
}
