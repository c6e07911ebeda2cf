//! One-time conversion of a schedule into the time-expanded graph.
//!
//! For every included trip, each consecutive pair of stop calls (A, B)
//! produces:
//!
//! ```text
//! Station/Platform(A) -BOARD-> RouteStation(A) -TO_SERVICE-> Service(A→B)
//!     -TO_HOUR-> Hour(hh) -TO_MINUTE-> Minute(trip, A, hh:mm)
//!     -GOES_TO-> RouteStation(B) -DEPART-> Station/Platform(B)
//! ```
//!
//! plus an ON_ROUTE edge RouteStation(A) → RouteStation(B) carrying the
//! running time, used for reachability and cost estimates but not by the
//! timed search.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info};

use super::interchange::Interchanges;
use super::model::{
    EdgeId, Graph, HourNode, MinuteNode, Node, NodeId, NodeKey, PlatformNode, Relation,
    RouteStationNode, ServiceNode, StationNode,
};
use super::{BuildError, GraphConfig};
use crate::domain::{PlatformId, RouteId, ServiceId, StationId, TransitTime, TransportMode};
use crate::schedule::{
    IncludeAll, Platform, Route, Schedule, ScheduleFilter, Station, StopCall, Trip,
};
use crate::walkable::WalkableConnections;

/// Earliest and latest scheduled departure of a calendar service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpan {
    pub earliest: TransitTime,
    pub latest: TransitTime,
}

impl ServiceSpan {
    fn widen(&mut self, time: TransitTime) {
        self.earliest = self.earliest.min(time);
        self.latest = self.latest.max(time);
    }
}

/// Everything produced by a graph build.
#[derive(Debug)]
pub struct BuiltGraph {
    pub graph: Graph,
    pub interchanges: Interchanges,
    pub neighbours: WalkableConnections,
    /// Departure span of every calendar service that made it into the graph.
    pub service_spans: BTreeMap<ServiceId, ServiceSpan>,
}

/// Dedup state for a single route. Service and hour nodes, and the edges
/// into them, never repeat across routes, so this is dropped after each
/// route.
#[derive(Default)]
struct RouteCache {
    to_service: HashMap<(NodeId, NodeId), EdgeId>,
    to_hour: HashSet<(NodeId, NodeId)>,
    on_route: HashMap<(NodeId, NodeId), EdgeId>,
}

/// Dedup state for the whole build, dropped once the graph is complete.
#[derive(Default)]
struct BuildCache {
    boarding: HashSet<(NodeId, NodeId)>,
    departing: HashSet<(NodeId, NodeId)>,
}

/// Builds the transport graph from a schedule.
pub struct GraphBuilder<'a, F = IncludeAll> {
    schedule: &'a Schedule,
    config: &'a GraphConfig,
    filter: F,
}

impl<'a> GraphBuilder<'a, IncludeAll> {
    /// Create a builder that includes the whole schedule.
    pub fn new(schedule: &'a Schedule, config: &'a GraphConfig) -> Self {
        Self {
            schedule,
            config,
            filter: IncludeAll,
        }
    }
}

impl<'a, F: ScheduleFilter> GraphBuilder<'a, F> {
    /// Restrict the build with an inclusion filter.
    pub fn with_filter<G: ScheduleFilter>(self, filter: G) -> GraphBuilder<'a, G> {
        GraphBuilder {
            schedule: self.schedule,
            config: self.config,
            filter,
        }
    }

    /// Build the graph, failing on any dangling reference.
    pub fn build(self) -> Result<BuiltGraph, BuildError> {
        let started = Instant::now();
        let schedule = self.schedule;

        let stations: Vec<_> = schedule
            .stations
            .iter()
            .filter(|s| self.filter.include_station(&s.id))
            .cloned()
            .collect();

        let neighbours = if self.config.create_neighbours {
            WalkableConnections::from_stations(
                &stations,
                self.config.neighbour_distance_m,
                self.config.walking_speed_m_per_min,
            )
        } else {
            WalkableConnections::new()
        };

        let interchanges = Interchanges::find(schedule, &self.filter, &neighbours, self.config);

        let mut run = BuildRun {
            config: self.config,
            graph: Graph::new(),
            interchanges: &interchanges,
            platforms: schedule.platforms.iter().map(|p| (&p.id, p)).collect(),
            service_spans: BTreeMap::new(),
            cache: BuildCache::default(),
        };

        run.add_stations(&stations)?;

        let routes: BTreeMap<&RouteId, &Route> =
            schedule.routes.iter().map(|r| (&r.id, r)).collect();
        let calendars: HashSet<&ServiceId> = schedule
            .calendars
            .iter()
            .map(|c| &c.service)
            .chain(schedule.exceptions.iter().map(|e| &e.service))
            .collect();

        let mut trips_by_route: BTreeMap<&RouteId, Vec<&Trip>> = BTreeMap::new();
        for trip in &schedule.trips {
            if !routes.contains_key(&trip.route) {
                return Err(BuildError::MissingRoute {
                    trip: trip.id.clone(),
                    route: trip.route.clone(),
                });
            }
            trips_by_route.entry(&trip.route).or_default().push(trip);
        }

        for (route_id, mut trips) in trips_by_route {
            let Some(route) = routes.get(route_id) else {
                continue;
            };
            if !self.filter.include_route(route) {
                continue;
            }
            trips.sort_by(|a, b| a.id.cmp(&b.id));

            let mut route_cache = RouteCache::default();
            let mut added = 0usize;
            for trip in trips {
                if !self.filter.include_service(&trip.service) {
                    continue;
                }
                if !calendars.contains(&trip.service) {
                    return Err(BuildError::MissingCalendar {
                        trip: trip.id.clone(),
                        service: trip.service.clone(),
                    });
                }
                run.add_trip(route, trip, &self.filter, &mut route_cache)?;
                added += 1;
            }
            drop(route_cache);
            debug!(route = %route.id, mode = %route.mode, trips = added, "route added");
        }

        run.add_neighbours(&neighbours);

        let BuildRun {
            graph,
            service_spans,
            cache,
            ..
        } = run;
        drop(cache);

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            interchanges = interchanges.len(),
            neighbours = neighbours.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "graph build complete"
        );

        Ok(BuiltGraph {
            graph,
            interchanges,
            neighbours,
            service_spans,
        })
    }
}

/// Mutable state of one build.
struct BuildRun<'a> {
    config: &'a GraphConfig,
    graph: Graph,
    interchanges: &'a Interchanges,
    platforms: HashMap<&'a PlatformId, &'a Platform>,
    service_spans: BTreeMap<ServiceId, ServiceSpan>,
    cache: BuildCache,
}

impl BuildRun<'_> {
    fn add_stations(&mut self, stations: &[Station]) -> Result<(), BuildError> {
        for station in stations {
            let interchange = self.interchanges.is_interchange(&station.id);
            let station_node = self
                .graph
                .get_or_insert(NodeKey::Station(station.id.clone()), || {
                    Node::Station(StationNode {
                        id: station.id.clone(),
                        name: station.name.clone(),
                        modes: station.modes.clone(),
                        position: station.position,
                        interchange,
                    })
                });

            for platform_id in &station.platforms {
                let platform = self.lookup_platform(platform_id, &station.id)?;
                let position = platform.position;
                let platform_node = self
                    .graph
                    .get_or_insert(NodeKey::Platform(platform_id.clone()), || {
                        Node::Platform(PlatformNode {
                            id: platform_id.clone(),
                            station: station.id.clone(),
                            position,
                        })
                    });
                self.graph
                    .add_edge(station_node, platform_node, 0, Relation::EnterPlatform);
                self.graph
                    .add_edge(platform_node, station_node, 0, Relation::LeavePlatform);
            }
        }
        Ok(())
    }

    fn lookup_platform(
        &self,
        platform: &PlatformId,
        station: &StationId,
    ) -> Result<&Platform, BuildError> {
        let found = self
            .platforms
            .get(platform)
            .copied()
            .ok_or_else(|| BuildError::MissingPlatform {
                platform: platform.clone(),
                station: station.clone(),
            })?;
        if &found.station != station {
            return Err(BuildError::PlatformStationMismatch {
                platform: platform.clone(),
                owner: found.station.clone(),
                station: station.clone(),
            });
        }
        Ok(found)
    }

    /// Node a passenger boards from or alights to for `call`.
    fn boarding_point(
        &self,
        trip: &Trip,
        call: &StopCall,
        mode: TransportMode,
    ) -> Result<NodeId, BuildError> {
        if mode.has_platforms() {
            if let Some(platform) = &call.platform {
                self.lookup_platform(platform, &call.station)?;
                return self
                    .graph
                    .find(&NodeKey::Platform(platform.clone()))
                    .ok_or_else(|| BuildError::MissingPlatform {
                        platform: platform.clone(),
                        station: call.station.clone(),
                    });
            }
        }
        self.graph
            .station(&call.station)
            .ok_or_else(|| BuildError::MissingStation {
                trip: trip.id.clone(),
                station: call.station.clone(),
            })
    }

    fn route_station(&mut self, route: &Route, station: &StationId) -> NodeId {
        self.graph.get_or_insert(
            NodeKey::RouteStation(route.id.clone(), station.clone()),
            || {
                Node::RouteStation(RouteStationNode {
                    route: route.id.clone(),
                    station: station.clone(),
                    mode: route.mode,
                })
            },
        )
    }

    fn ensure_board(
        &mut self,
        point: NodeId,
        route_station: NodeId,
        call: &StopCall,
        mode: TransportMode,
    ) {
        if !self.cache.boarding.insert((point, route_station)) {
            return;
        }
        let costs = self.config.costs(mode);
        let (cost, relation) = if self.interchanges.is_interchange(&call.station) {
            (costs.interchange_board, Relation::InterchangeBoard { mode })
        } else {
            (costs.board, Relation::Board { mode })
        };
        self.graph.add_edge(point, route_station, cost, relation);
    }

    fn ensure_depart(
        &mut self,
        route_station: NodeId,
        point: NodeId,
        call: &StopCall,
        mode: TransportMode,
    ) {
        if !self.cache.departing.insert((route_station, point)) {
            return;
        }
        let costs = self.config.costs(mode);
        let (cost, relation) = if self.interchanges.is_interchange(&call.station) {
            (costs.interchange_depart, Relation::InterchangeDepart { mode })
        } else {
            (costs.depart, Relation::Depart { mode })
        };
        self.graph.add_edge(route_station, point, cost, relation);
    }

    fn add_trip(
        &mut self,
        route: &Route,
        trip: &Trip,
        filter: &impl ScheduleFilter,
        route_cache: &mut RouteCache,
    ) -> Result<(), BuildError> {
        let (Some(first_seq), Some(last_seq)) = (trip.first_sequence(), trip.last_sequence()) else {
            return Ok(());
        };

        let calls: Vec<&StopCall> = trip
            .calls_in_order()
            .into_iter()
            .filter(|c| filter.include_station(&c.station))
            .collect();

        for call in &calls {
            if self.graph.station(&call.station).is_none() {
                return Err(BuildError::MissingStation {
                    trip: trip.id.clone(),
                    station: call.station.clone(),
                });
            }
        }

        let mode = route.mode;
        for pair in calls.windows(2) {
            let (from, to) = (pair[0], pair[1]);

            let from_rs = self.route_station(route, &from.station);
            let to_rs = self.route_station(route, &to.station);
            let from_point = self.boarding_point(trip, from, mode)?;
            let to_point = self.boarding_point(trip, to, mode)?;

            // Sequence numbers, not list positions: filtered-out stops must not
            // turn an intermediate stop into a terminus.
            if from.sequence != last_seq && from.pick_up {
                self.ensure_board(from_point, from_rs, from, mode);
            }
            if from.sequence != first_seq && from.drop_off {
                self.ensure_depart(from_rs, from_point, from, mode);
            }
            if to.sequence != first_seq && to.drop_off {
                self.ensure_depart(to_rs, to_point, to, mode);
            }
            if to.sequence != last_seq && to.pick_up {
                self.ensure_board(to_point, to_rs, to, mode);
            }

            let running = to.arrival.minutes_since(from.departure).max(0) as u32;

            match route_cache.on_route.get(&(from_rs, to_rs)) {
                Some(edge) => {
                    if let Some(edge) = self.graph.edge_mut(*edge) {
                        edge.cost = edge.cost.min(running);
                    }
                }
                None => {
                    let edge = self.graph.add_edge(
                        from_rs,
                        to_rs,
                        running,
                        Relation::OnRoute {
                            route: route.id.clone(),
                        },
                    );
                    route_cache.on_route.insert((from_rs, to_rs), edge);
                }
            }

            let service_node = self.graph.get_or_insert(
                NodeKey::Service {
                    route: route.id.clone(),
                    service: trip.service.clone(),
                    from: from.station.clone(),
                    to: to.station.clone(),
                },
                || {
                    Node::Service(ServiceNode {
                        service: trip.service.clone(),
                        route: route.id.clone(),
                        from: from.station.clone(),
                        to: to.station.clone(),
                    })
                },
            );

            match route_cache.to_service.get(&(from_rs, service_node)) {
                Some(edge) => {
                    if let Some(Relation::ToService { trips }) =
                        self.graph.edge_mut(*edge).map(|e| &mut e.relation)
                    {
                        trips.insert(trip.id.clone());
                    }
                }
                None => {
                    let edge = self.graph.add_edge(
                        from_rs,
                        service_node,
                        0,
                        Relation::ToService {
                            trips: [trip.id.clone()].into(),
                        },
                    );
                    route_cache.to_service.insert((from_rs, service_node), edge);
                }
            }

            let hour = from.departure.hour();
            let hour_node = self.graph.get_or_insert(
                NodeKey::Hour {
                    service_node,
                    hour,
                },
                || {
                    Node::Hour(HourNode {
                        service: trip.service.clone(),
                        from: from.station.clone(),
                        hour,
                    })
                },
            );
            if route_cache.to_hour.insert((service_node, hour_node)) {
                self.graph
                    .add_edge(service_node, hour_node, 0, Relation::ToHour);
            }

            let minute_key = NodeKey::Minute {
                trip: trip.id.clone(),
                station: from.station.clone(),
                time: from.departure,
            };
            if self.graph.find(&minute_key).is_none() {
                let minute_node = self.graph.get_or_insert(minute_key, || {
                    Node::Minute(MinuteNode {
                        trip: trip.id.clone(),
                        service: trip.service.clone(),
                        station: from.station.clone(),
                        time: from.departure,
                    })
                });
                self.graph.add_edge(
                    hour_node,
                    minute_node,
                    0,
                    Relation::ToMinute {
                        trip: trip.id.clone(),
                    },
                );
                self.graph.add_edge(
                    minute_node,
                    to_rs,
                    running,
                    Relation::GoesTo {
                        trip: trip.id.clone(),
                        service: trip.service.clone(),
                        mode,
                    },
                );
            }

            self.service_spans
                .entry(trip.service.clone())
                .or_insert(ServiceSpan {
                    earliest: from.departure,
                    latest: from.departure,
                })
                .widen(from.departure);
        }

        Ok(())
    }

    fn add_neighbours(&mut self, neighbours: &WalkableConnections) {
        for (from, to, minutes) in neighbours.pairs() {
            if let (Some(a), Some(b)) = (self.graph.station(from), self.graph.station(to)) {
                self.graph.add_edge(a, b, minutes, Relation::Neighbour);
            }
        }
    }
}
