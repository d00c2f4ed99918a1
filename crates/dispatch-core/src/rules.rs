//! Planner rules and thresholds for the dispatch engine.

use serde::{Deserialize, Serialize};

/// Length of a single drone move, in coordinate degrees.
pub const UNIT_LENGTH: f64 = 0.00015;

/// Configuration for path search and dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerRules {
    /// Move length; also the A* edge cost and the arrival threshold
    pub unit_length: f64,
    /// A search that reaches this many expansions is abandoned as unroutable
    pub max_expansions: usize,
    /// Padding (degrees) around start, goal and no-fly vertices that bounds
    /// the search area. `None` searches the unbounded plane.
    pub corridor_margin: Option<f64>,
}

impl Default for PlannerRules {
    fn default() -> Self {
        Self {
            unit_length: UNIT_LENGTH,
            max_expansions: 1_000_000,
            corridor_margin: Some(0.01),
        }
    }
}

impl PlannerRules {
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_corridor_margin(mut self, corridor_margin: Option<f64>) -> Self {
        self.corridor_margin = corridor_margin;
        self
    }
}
