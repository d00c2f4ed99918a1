//! Dispatch scheduler.
//!
//! Requests are grouped by date and ordered by time. For each date every
//! drone, in fleet order, flies as many flights as it can from the pending
//! pool. A flight greedily accepts requests that share its base and keep it
//! within capacity, move budget and cost ceiling, then returns to base.

use crate::assembler::{CompletedFlight, PlanAssembler};
use crate::availability::AvailabilityIndex;
use crate::models::{
    Catalog, Coordinate, Delivery, DeliveryRequest, Drone, FlightPlan, Region, ServicePoint,
    ServicePointDrones,
};
use crate::pathfinder::Pathfinder;
use crate::rules::PlannerRules;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Drone limit a request would break if added to the open flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Constraint {
    #[error("remaining capacity too small")]
    Capacity,
    #[error("cooling required")]
    Cooling,
    #[error("heating required")]
    Heating,
    #[error("move budget exceeded")]
    MoveBudget,
    #[error("average cost above ceiling")]
    CostCap,
}

/// Why a request stays pending for the flight being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("drone not stationed anywhere at the request time")]
    DroneUnavailable,
    #[error("request launches from a different base than the open flight")]
    BaseMismatch,
    #[error("no route between base and delivery point")]
    NoRouteFound,
    #[error("{0}")]
    ConstraintViolation(Constraint),
}

impl From<Constraint> for SkipReason {
    fn from(constraint: Constraint) -> Self {
        SkipReason::ConstraintViolation(constraint)
    }
}

/// A flight being assembled for one drone.
#[derive(Debug, Clone)]
pub struct OpenFlight<'a> {
    drone: &'a Drone,
    base: Option<Coordinate>,
    position: Option<Coordinate>,
    remaining_capacity: f64,
    moves: u64,
    legs: Vec<Delivery>,
    /// Path from the last delivery point back to base.
    return_leg: Vec<Coordinate>,
    /// Tightest `maxCost` among the carried requests.
    cost_ceiling: Option<f64>,
}

impl<'a> OpenFlight<'a> {
    pub fn new(drone: &'a Drone) -> Self {
        Self {
            drone,
            base: None,
            position: None,
            remaining_capacity: drone.capability.capacity,
            moves: 0,
            legs: Vec::new(),
            return_leg: Vec::new(),
            cost_ceiling: None,
        }
    }

    pub fn drone(&self) -> &Drone {
        self.drone
    }

    /// Base locked by the first request whose base resolved, accepted or not.
    pub fn base(&self) -> Option<Coordinate> {
        self.base
    }

    pub fn remaining_capacity(&self) -> f64 {
        self.remaining_capacity
    }

    /// Moves flown on delivery legs so far (return leg excluded).
    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn delivery_count(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    fn take_off_and_landing(&self) -> f64 {
        self.drone.capability.cost_initial + self.drone.capability.cost_final
    }

    /// Cost of a flight totalling `moves` moves.
    fn cost_for(&self, moves: u64) -> f64 {
        self.take_off_and_landing() + moves as f64 * self.drone.capability.cost_per_move
    }

    /// Add `request` to the flight if every limit still holds.
    ///
    /// `base` is where the drone is stationed at the request's time. The
    /// first call locks the flight to that base even if the request itself
    /// is then rejected; otherwise a rejection leaves the flight unchanged.
    pub fn try_add(
        &mut self,
        request: &DeliveryRequest,
        base: Coordinate,
        pathfinder: &Pathfinder,
    ) -> Result<(), SkipReason> {
        match self.base {
            Some(locked) if locked != base => return Err(SkipReason::BaseMismatch),
            Some(_) => {}
            None => self.base = Some(base),
        }

        let requirements = &request.requirements;
        let capability = &self.drone.capability;
        if requirements.capacity > self.remaining_capacity {
            return Err(Constraint::Capacity.into());
        }
        if requirements.needs_cooling() && !capability.cooling {
            return Err(Constraint::Cooling.into());
        }
        if requirements.needs_heating() && !capability.heating {
            return Err(Constraint::Heating.into());
        }

        let from = self.position.unwrap_or(base);
        let mut outbound = pathfinder.find_path(from, request.delivery);
        let Some(&arrival) = outbound.last() else {
            return Err(SkipReason::NoRouteFound);
        };
        let inbound = pathfinder.find_path(request.delivery, base);
        if inbound.is_empty() {
            return Err(SkipReason::NoRouteFound);
        }

        let moves = self.moves + outbound.len() as u64;
        let projected_moves = moves + inbound.len() as u64;
        if projected_moves > u64::from(capability.max_moves) {
            return Err(Constraint::MoveBudget.into());
        }

        let cost_ceiling = match (self.cost_ceiling, requirements.max_cost) {
            (Some(current), Some(requested)) => Some(current.min(requested)),
            (current, requested) => current.or(requested),
        };
        if let Some(ceiling) = cost_ceiling {
            let average = self.cost_for(projected_moves) / (self.legs.len() + 1) as f64;
            if average > ceiling {
                return Err(Constraint::CostCap.into());
            }
        }

        // Hover over the delivery point while the package is released.
        outbound.push(arrival);

        self.position = Some(request.delivery);
        self.remaining_capacity -= requirements.capacity;
        self.moves = moves;
        self.cost_ceiling = cost_ceiling;
        self.legs.push(Delivery {
            delivery_id: Some(request.id),
            flight_path: outbound,
        });
        self.return_leg = inbound;
        Ok(())
    }

    /// Append the return leg and price the flight. `None` if nothing was accepted.
    pub fn close(self, date: NaiveDate) -> Option<CompletedFlight> {
        if self.legs.is_empty() {
            return None;
        }
        let moves = self.moves + self.return_leg.len() as u64;
        let cost = self.cost_for(moves);
        let mut legs = self.legs;
        legs.push(Delivery {
            delivery_id: None,
            flight_path: self.return_leg,
        });
        Some(CompletedFlight {
            drone_id: self.drone.id.clone(),
            date,
            legs,
            moves,
            cost,
        })
    }
}

/// Where a drone is in its day of flights.
#[derive(Debug)]
pub enum DispatchState<'a> {
    /// Scanning the pending pool for a new flight.
    CollectingFlight,
    /// A flight holds at least one request and is about to return.
    ClosingFlight(OpenFlight<'a>),
    /// No further flight can make progress.
    Done,
}

/// One drone working through one date's pending requests.
#[derive(Debug)]
pub struct DroneShift<'a> {
    drone: &'a Drone,
    date: NaiveDate,
    index: &'a AvailabilityIndex,
    pathfinder: &'a Pathfinder,
    state: DispatchState<'a>,
}

impl<'a> DroneShift<'a> {
    pub fn new(
        drone: &'a Drone,
        date: NaiveDate,
        index: &'a AvailabilityIndex,
        pathfinder: &'a Pathfinder,
    ) -> Self {
        Self {
            drone,
            date,
            index,
            pathfinder,
            state: DispatchState::CollectingFlight,
        }
    }

    pub fn state(&self) -> &DispatchState<'a> {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, DispatchState::Done)
    }

    /// Advance one transition. Returns the flight when one closes.
    ///
    /// Accepted requests are removed from `pending`; the rest keep their order.
    pub fn step(&mut self, pending: &mut Vec<&DeliveryRequest>) -> Option<CompletedFlight> {
        match std::mem::replace(&mut self.state, DispatchState::Done) {
            DispatchState::CollectingFlight => {
                if pending.is_empty() {
                    return None;
                }
                let flight = self.collect(pending);
                if !flight.is_empty() {
                    self.state = DispatchState::ClosingFlight(flight);
                }
                None
            }
            DispatchState::ClosingFlight(flight) => {
                let completed = flight.close(self.date);
                if let Some(flight) = &completed {
                    debug!(
                        "drone {} closed flight on {} with deliveries {:?} ({} moves, cost {:.2})",
                        flight.drone_id,
                        flight.date,
                        flight.delivery_ids(),
                        flight.moves,
                        flight.cost
                    );
                }
                if !pending.is_empty() {
                    self.state = DispatchState::CollectingFlight;
                }
                completed
            }
            DispatchState::Done => None,
        }
    }

    /// Run until the drone can make no further progress.
    pub fn run(mut self, pending: &mut Vec<&DeliveryRequest>, assembler: &mut PlanAssembler) {
        while !self.is_done() {
            if let Some(flight) = self.step(pending) {
                assembler.record_flight(flight);
            }
        }
    }

    fn collect(&self, pending: &mut Vec<&DeliveryRequest>) -> OpenFlight<'a> {
        let mut flight = OpenFlight::new(self.drone);
        pending.retain(|request| match self.consider(&mut flight, request) {
            Ok(()) => false,
            Err(reason) => {
                trace!(
                    "drone {} skipped request {}: {}",
                    self.drone.id,
                    request.id,
                    reason
                );
                true
            }
        });
        flight
    }

    fn consider(&self, flight: &mut OpenFlight<'a>, request: &DeliveryRequest) -> Result<(), SkipReason> {
        let base = self
            .index
            .find_base(&self.drone.id, request.date, request.time)
            .ok_or(SkipReason::DroneUnavailable)?;
        flight.try_add(request, base, self.pathfinder)
    }
}

/// Requests bucketed by date, each bucket ordered by time of day.
///
/// Equal times keep their input order.
pub fn group_by_date(requests: &[DeliveryRequest]) -> BTreeMap<NaiveDate, Vec<&DeliveryRequest>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&DeliveryRequest>> = BTreeMap::new();
    for request in requests {
        groups.entry(request.date).or_default().push(request);
    }
    for bucket in groups.values_mut() {
        bucket.sort_by_key(|request| request.time);
    }
    groups
}

/// Planner bound to one catalog snapshot.
#[derive(Debug)]
pub struct Dispatcher<'a> {
    drones: &'a [Drone],
    index: AvailabilityIndex,
    pathfinder: Pathfinder,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        service_points: &[ServicePoint],
        no_fly_zones: &[Region],
        drones: &'a [Drone],
        service_point_drones: &[ServicePointDrones],
        rules: &PlannerRules,
    ) -> Self {
        Self {
            drones,
            index: AvailabilityIndex::new(service_points, service_point_drones),
            pathfinder: Pathfinder::new(no_fly_zones, rules.clone()),
        }
    }

    pub fn availability(&self) -> &AvailabilityIndex {
        &self.index
    }

    pub fn dispatch(&self, requests: &[DeliveryRequest]) -> FlightPlan {
        let mut assembler = PlanAssembler::new();
        let mut unserved = 0usize;

        for (date, mut pending) in group_by_date(requests) {
            for drone in self.drones {
                if pending.is_empty() {
                    break;
                }
                DroneShift::new(drone, date, &self.index, &self.pathfinder)
                    .run(&mut pending, &mut assembler);
            }
            if !pending.is_empty() {
                debug!("{} requests on {} left unserved", pending.len(), date);
                unserved += pending.len();
            }
        }

        info!(
            "planned {} flights for {} requests ({} unserved): {} moves, cost {:.2}",
            assembler.flight_count(),
            requests.len(),
            unserved,
            assembler.total_moves(),
            assembler.total_cost()
        );
        assembler.finish()
    }
}

/// Plan every request with default rules.
pub fn plan(
    requests: &[DeliveryRequest],
    service_points: &[ServicePoint],
    no_fly_zones: &[Region],
    drones: &[Drone],
    service_point_drones: &[ServicePointDrones],
) -> FlightPlan {
    plan_with_rules(
        requests,
        service_points,
        no_fly_zones,
        drones,
        service_point_drones,
        &PlannerRules::default(),
    )
}

pub fn plan_with_rules(
    requests: &[DeliveryRequest],
    service_points: &[ServicePoint],
    no_fly_zones: &[Region],
    drones: &[Drone],
    service_point_drones: &[ServicePointDrones],
    rules: &PlannerRules,
) -> FlightPlan {
    Dispatcher::new(service_points, no_fly_zones, drones, service_point_drones, rules).dispatch(requests)
}

/// Plan against a catalog snapshot.
pub fn plan_catalog(requests: &[DeliveryRequest], catalog: &Catalog, rules: &PlannerRules) -> FlightPlan {
    plan_with_rules(
        requests,
        &catalog.service_points,
        &catalog.restricted_areas,
        &catalog.drones,
        &catalog.service_point_drones,
        rules,
    )
}
