//! Domain types for the journey planner.
//!
//! This module contains the value types shared by the schedule model, the
//! graph and the search engine. Types enforce their invariants at
//! construction time, so code that receives them can trust their validity.

mod ids;
mod mode;
mod position;
mod time;

pub use ids::{InvalidId, PlatformId, RouteId, ServiceId, StationId, TripId};
pub use mode::TransportMode;
pub use position::LatLong;
pub use time::{TimeError, TransitTime};
