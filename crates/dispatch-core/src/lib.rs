pub mod assembler;
pub mod availability;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod geometry;
pub mod models;
pub mod pathfinder;
pub mod query;
pub mod rules;

pub use assembler::{CompletedFlight, PlanAssembler};
pub use availability::{find_base, AvailabilityIndex};
pub use dispatch::{
    group_by_date, plan, plan_catalog, plan_with_rules, Constraint, DispatchState, Dispatcher,
    DroneShift, OpenFlight, SkipReason,
};
pub use error::{Error, Result};
pub use geometry::{distance, is_close_to, next_position, point_in_polygon, round_to_five_places};
pub use models::{
    Availability, Capability, Catalog, Coordinate, DayOfWeek, Delivery, DeliveryRequest, Drone,
    DroneAvailability, DronePath, FlightPlan, Region, Requirements, RestrictedArea, ServicePoint,
    ServicePointDrones,
};
pub use pathfinder::{find_path, PathSearch, Pathfinder, SearchOutcome};
pub use query::{
    drone_details, drones_with_cooling, query, query_available_drones, AttributeValue,
    Comparison, DroneAttribute, DroneFilter, QueryCondition,
};
pub use rules::{PlannerRules, UNIT_LENGTH};
