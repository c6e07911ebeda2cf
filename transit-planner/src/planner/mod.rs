//! Journey planner over the time-expanded graph.
//!
//! This module answers: "leaving here at this time, how do I get there?"
//!
//! Each candidate time is searched depth-first by its own
//! [`TraversalEngine`]. Every step is checked by the pure functions in
//! [`heuristics`]; the calendar, per-route reachability and visited-state
//! memo exist to make those checks cheap and the search small. Accepted paths
//! are folded into [`Itinerary`] values by [`map_path`].

mod calendar;
mod config;
pub mod heuristics;
mod itinerary;
mod rank;
mod reachability;
mod search;
mod state;
mod traversal;
mod visited;

pub use calendar::{CalendarIndex, RunningServices};
pub use config::SearchConfig;
pub use heuristics::{Admission, Diagnostics, RejectReason};
pub use itinerary::{Itinerary, Leg, Place, VehicleLeg, WalkLeg, map_path};
pub use rank::{deduplicate, rank_itineraries};
pub use reachability::{Reachability, RouteReach, walking_targets};
pub use search::{Endpoint, JourneyRequest, Journeys, Planner, SearchError};
pub use state::{JourneyState, StateError};
pub use traversal::{FoundPath, QueryContext, Step, TraversalEngine};
pub use visited::VisitedCache;
