//! Graph build errors.
//!
//! Any of these aborts the build: a graph missing a referenced station or
//! platform would route journeys through nodes that do not exist.

use crate::domain::{PlatformId, RouteId, ServiceId, StationId, TripId};

/// Integrity failures found while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A stop call names a station the schedule does not contain
    #[error("trip {trip} calls at unknown station {station}")]
    MissingStation { trip: TripId, station: StationId },

    /// A stop call or station names a platform the schedule does not contain
    #[error("unknown platform {platform} at station {station}")]
    MissingPlatform {
        platform: PlatformId,
        station: StationId,
    },

    /// A platform is owned by a different station than the one using it
    #[error("platform {platform} belongs to {owner}, not {station}")]
    PlatformStationMismatch {
        platform: PlatformId,
        owner: StationId,
        station: StationId,
    },

    /// A trip names a route the schedule does not contain
    #[error("trip {trip} references unknown route {route}")]
    MissingRoute { trip: TripId, route: RouteId },

    /// A trip's service has neither a calendar nor calendar exceptions
    #[error("trip {trip} references service {service} with no calendar")]
    MissingCalendar { trip: TripId, service: ServiceId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BuildError::MissingStation {
            trip: TripId::parse("T1").unwrap(),
            station: StationId::parse("XYZ").unwrap(),
        };
        assert_eq!(err.to_string(), "trip T1 calls at unknown station XYZ");

        let err = BuildError::MissingCalendar {
            trip: TripId::parse("T1").unwrap(),
            service: ServiceId::parse("SUN").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "trip T1 references service SUN with no calendar"
        );
    }
}
