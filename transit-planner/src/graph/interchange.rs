//! Interchange classification.
//!
//! A station is an interchange if the source data says so, if enough
//! distinct onward links leave it for some mode, if it serves more than one
//! mode, or if a walking neighbour serves a mode it does not. When the
//! network is configured to change only at marked interchanges, just the
//! first rule applies.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::GraphConfig;
use crate::domain::{StationId, TransportMode};
use crate::schedule::{Route, Schedule, ScheduleFilter};
use crate::walkable::WalkableConnections;

/// Why a station was classified as an interchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterchangeReason {
    /// Marked in the source data.
    Marked,
    /// At least the configured number of distinct onward links for a mode.
    Links { mode: TransportMode, count: usize },
    /// Serves two or more modes.
    MultiMode,
    /// A walking neighbour serves a different mode.
    CrossModeNeighbour,
}

/// The set of interchange stations in a network.
#[derive(Debug, Clone, Default)]
pub struct Interchanges {
    stations: BTreeMap<StationId, InterchangeReason>,
}

impl Interchanges {
    /// Classify every included station of `schedule`.
    pub fn find(
        schedule: &Schedule,
        filter: &impl ScheduleFilter,
        neighbours: &WalkableConnections,
        config: &GraphConfig,
    ) -> Self {
        let mut stations = BTreeMap::new();

        for station in &schedule.stations {
            if station.is_interchange && filter.include_station(&station.id) {
                stations.insert(station.id.clone(), InterchangeReason::Marked);
            }
        }

        if config.change_at_interchange_only {
            debug!(count = stations.len(), "interchanges from source data only");
            return Self { stations };
        }

        let routes: HashMap<_, &Route> = schedule.routes.iter().map(|r| (&r.id, r)).collect();

        // Modes served and distinct onward links per (station, mode)
        let mut modes: HashMap<&StationId, BTreeSet<TransportMode>> = HashMap::new();
        let mut links: HashMap<(&StationId, TransportMode), BTreeSet<&StationId>> = HashMap::new();

        for station in &schedule.stations {
            if filter.include_station(&station.id) {
                modes
                    .entry(&station.id)
                    .or_default()
                    .extend(station.modes.iter().copied());
            }
        }

        for trip in &schedule.trips {
            let Some(route) = routes.get(&trip.route) else {
                continue;
            };
            if !filter.include_route(route) || !filter.include_service(&trip.service) {
                continue;
            }
            let calls: Vec<_> = trip
                .calls_in_order()
                .into_iter()
                .filter(|c| filter.include_station(&c.station))
                .collect();
            for call in &calls {
                modes.entry(&call.station).or_default().insert(route.mode);
            }
            for pair in calls.windows(2) {
                if pair[0].station != pair[1].station {
                    links
                        .entry((&pair[0].station, route.mode))
                        .or_default()
                        .insert(&pair[1].station);
                }
            }
        }

        let mut by_links: Vec<_> = links.into_iter().collect();
        by_links.sort_by(|a, b| a.0.cmp(&b.0));
        for ((station, mode), onward) in by_links {
            let count = onward.len();
            if count >= config.interchange_threshold(mode) {
                stations
                    .entry(station.clone())
                    .or_insert(InterchangeReason::Links { mode, count });
            }
        }

        for (station, served) in &modes {
            if served.len() >= 2 {
                stations
                    .entry((*station).clone())
                    .or_insert(InterchangeReason::MultiMode);
            }
        }

        for (from, to, _) in neighbours.pairs() {
            let (Some(from_modes), Some(to_modes)) = (modes.get(from), modes.get(to)) else {
                continue;
            };
            if !to_modes.is_subset(from_modes) {
                stations
                    .entry(from.clone())
                    .or_insert(InterchangeReason::CrossModeNeighbour);
            }
        }

        debug!(count = stations.len(), "interchanges classified");
        Self { stations }
    }

    pub fn is_interchange(&self, station: &StationId) -> bool {
        self.stations.contains_key(station)
    }

    pub fn reason(&self, station: &StationId) -> Option<InterchangeReason> {
        self.stations.get(station).copied()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
