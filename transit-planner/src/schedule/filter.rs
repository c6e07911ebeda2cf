//! Inclusion predicates applied while building the graph.
//!
//! Production builds include everything; tests and partial networks restrict
//! the build to a subset of routes, services or stations.

use std::collections::HashSet;

use super::Route;
use crate::domain::{RouteId, ServiceId, StationId};

/// Decides which parts of the schedule make it into the graph.
///
/// Every method defaults to "include".
pub trait ScheduleFilter {
    fn include_route(&self, _route: &Route) -> bool {
        true
    }

    fn include_service(&self, _service: &ServiceId) -> bool {
        true
    }

    fn include_station(&self, _station: &StationId) -> bool {
        true
    }
}

/// Includes the whole schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeAll;

impl ScheduleFilter for IncludeAll {}

/// Restricts the build to explicit sets of routes, services and stations.
///
/// A `None` set means "no restriction" for that dimension.
#[derive(Debug, Clone, Default)]
pub struct SubsetFilter {
    routes: Option<HashSet<RouteId>>,
    services: Option<HashSet<ServiceId>>,
    stations: Option<HashSet<StationId>>,
}

impl SubsetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include these routes.
    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteId>) -> Self {
        self.routes = Some(routes.into_iter().collect());
        self
    }

    /// Only include these calendar services.
    pub fn services(mut self, services: impl IntoIterator<Item = ServiceId>) -> Self {
        self.services = Some(services.into_iter().collect());
        self
    }

    /// Only include calls at these stations.
    pub fn stations(mut self, stations: impl IntoIterator<Item = StationId>) -> Self {
        self.stations = Some(stations.into_iter().collect());
        self
    }
}

impl ScheduleFilter for SubsetFilter {
    fn include_route(&self, route: &Route) -> bool {
        self.routes.as_ref().is_none_or(|r| r.contains(&route.id))
    }

    fn include_service(&self, service: &ServiceId) -> bool {
        self.services.as_ref().is_none_or(|s| s.contains(service))
    }

    fn include_station(&self, station: &StationId) -> bool {
        self.stations.as_ref().is_none_or(|s| s.contains(station))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportMode;

    fn route(id: &str) -> Route {
        Route {
            id: RouteId::parse(id).unwrap(),
            name: id.to_string(),
            mode: TransportMode::Tram,
        }
    }

    #[test]
    fn include_all_accepts_everything() {
        let filter = IncludeAll;
        assert!(filter.include_route(&route("Green")));
        assert!(filter.include_service(&ServiceId::parse("S").unwrap()));
        assert!(filter.include_station(&StationId::parse("X").unwrap()));
    }

    #[test]
    fn subset_restricts_only_given_dimensions() {
        let filter = SubsetFilter::new().routes([RouteId::parse("Green").unwrap()]);

        assert!(filter.include_route(&route("Green")));
        assert!(!filter.include_route(&route("Blue")));
        // Unrestricted dimensions pass
        assert!(filter.include_service(&ServiceId::parse("ANY").unwrap()));
        assert!(filter.include_station(&StationId::parse("ANY").unwrap()));
    }

    #[test]
    fn subset_stations() {
        let filter = SubsetFilter::new().stations([StationId::parse("A").unwrap()]);
        assert!(filter.include_station(&StationId::parse("A").unwrap()));
        assert!(!filter.include_station(&StationId::parse("B").unwrap()));
    }
}
