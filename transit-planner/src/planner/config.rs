//! Search configuration for the journey planner.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::RouteId;

/// Configuration parameters for journey search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Longest wait for a departure before the option is abandoned (minutes).
    pub max_wait_mins: u32,

    /// Maximum number of edges on a single path.
    pub max_path_length: usize,

    /// How far a location origin or destination may be from a station and
    /// still walk to it (metres).
    pub max_walk_distance_m: f64,

    /// Route to try first when choosing which vehicle to board.
    pub preferred_route: Option<RouteId>,

    /// Tally rejection reasons per query and log them when the search ends.
    pub diagnostics: bool,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(max_wait_mins: u32, max_path_length: usize, max_walk_distance_m: f64) -> Self {
        Self {
            max_wait_mins,
            max_path_length,
            max_walk_distance_m,
            preferred_route: None,
            diagnostics: false,
        }
    }

    /// Prefer boarding `route` when several vehicles could be boarded.
    pub fn with_preferred_route(mut self, route: RouteId) -> Self {
        self.preferred_route = Some(route);
        self
    }

    /// Enable rejection tallies.
    pub fn with_diagnostics(mut self) -> Self {
        self.diagnostics = true;
        self
    }

    /// Returns the maximum wait as a Duration.
    pub fn max_wait(&self) -> Duration {
        Duration::minutes(self.max_wait_mins as i64)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_wait_mins: 30,
            max_path_length: 400,
            max_walk_distance_m: 800.0,
            preferred_route: None,
            diagnostics: false,
        }
    }
}
