//! Journey planning over a built transport network.
//!
//! A [`Planner`] answers requests from an origin to a destination on one
//! travel date at one or more candidate times. Each candidate time gets its
//! own [`TraversalEngine`], run lazily as the caller pulls itineraries.
//! Locations given as coordinates are joined to the network by walking edges
//! that live in a query-scoped [`QueryOverlay`] and vanish with the engine.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, trace, warn};

use crate::domain::{LatLong, StationId, TransitTime, TransportMode};
use crate::graph::{EdgeKind, GraphView, NodeId, QueryOverlay, Relation};
use crate::network::TransportNetwork;
use crate::walkable::{stations_within, walk_minutes};

use super::config::SearchConfig;
use super::heuristics::Diagnostics;
use super::itinerary::{Itinerary, LegKey, map_path};
use super::rank::{deduplicate, rank_itineraries};
use super::reachability::walking_targets;
use super::state::StateError;
use super::traversal::{QueryContext, TraversalEngine};

/// Error from journey search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The station id is not in the network.
    #[error("unknown station: {0}")]
    UnknownStation(StationId),

    /// The station serves none of the requested modes.
    #[error("station {station} is not served by any requested mode")]
    ModeMismatch { station: StationId },

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// The search let through a step the journey state cannot take.
    #[error("journey state violated: {0}")]
    StateViolation(#[from] StateError),

    /// A concurrent search task panicked or was cancelled.
    #[error("search task failed: {0}")]
    TaskFailed(String),
}

/// Where a journey starts or ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    Station(StationId),
    /// A location, joined to the network by walking to nearby stations.
    Location(LatLong),
}

/// Request for journey search.
#[derive(Debug, Clone)]
pub struct JourneyRequest {
    pub origin: Endpoint,
    pub destination: Endpoint,
    pub date: NaiveDate,
    /// Candidate times, each searched independently.
    pub times: Vec<TransitTime>,
    /// Modes the traveller will board. `None` allows all.
    pub modes: Option<BTreeSet<TransportMode>>,
}

impl JourneyRequest {
    pub fn new(
        origin: Endpoint,
        destination: Endpoint,
        date: NaiveDate,
        times: impl IntoIterator<Item = TransitTime>,
    ) -> Self {
        Self {
            origin,
            destination,
            date,
            times: times.into_iter().collect(),
            modes: None,
        }
    }

    /// Only board vehicles of the given modes.
    pub fn with_modes(mut self, modes: impl IntoIterator<Item = TransportMode>) -> Self {
        self.modes = Some(modes.into_iter().collect());
        self
    }

    /// Validate the request, independent of any network.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.times.is_empty() {
            return Err(SearchError::InvalidRequest(
                "no candidate times given".to_string(),
            ));
        }
        if self.origin == self.destination {
            return Err(SearchError::InvalidRequest(
                "origin and destination are the same".to_string(),
            ));
        }
        if self.modes.as_ref().is_some_and(BTreeSet::is_empty) {
            return Err(SearchError::InvalidRequest(
                "empty mode filter".to_string(),
            ));
        }
        Ok(())
    }
}

/// An endpoint resolved against the network.
#[derive(Debug)]
enum Resolved {
    Station(NodeId),
    Location {
        position: LatLong,
        /// Stations within walking range, with walk minutes.
        walks: Vec<(StationId, u32)>,
    },
}

/// Everything about a request that does not depend on the query time.
#[derive(Debug)]
struct PreparedQuery {
    context: Arc<QueryContext>,
    origin: Resolved,
    destination: Resolved,
    /// Minutes for a direct walk, when both endpoints are locations in range.
    direct_walk: Option<u32>,
}

/// Journey planner over a shared network.
///
/// Cloning is cheap; clones share the network.
#[derive(Debug, Clone)]
pub struct Planner {
    network: Arc<TransportNetwork>,
    config: Arc<SearchConfig>,
}

impl Planner {
    /// Create a new planner.
    pub fn new(network: Arc<TransportNetwork>, config: SearchConfig) -> Self {
        Self {
            network,
            config: Arc::new(config),
        }
    }

    pub fn network(&self) -> &TransportNetwork {
        &self.network
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Plan journeys, lazily.
    ///
    /// Fails up front if the request is invalid or names a station the
    /// network does not know. Finding nothing is an empty iterator.
    pub fn plan_journeys(&self, request: &JourneyRequest) -> Result<Journeys<'_>, SearchError> {
        let prepared = self.prepare(request)?;
        Ok(Journeys::new(self, Arc::new(prepared), request.times.clone()))
    }

    /// Plan every candidate time on the blocking pool and merge the results.
    ///
    /// Each time contributes at most `per_time_limit` itineraries. The merged
    /// list has duplicates removed and is ordered best first.
    pub async fn plan_concurrently(
        &self,
        request: JourneyRequest,
        per_time_limit: usize,
    ) -> Result<Vec<Itinerary>, SearchError> {
        let prepared = Arc::new(self.prepare(&request)?);

        let tasks: Vec<_> = request
            .times
            .iter()
            .map(|&time| {
                let planner = self.clone();
                let prepared = Arc::clone(&prepared);
                tokio::task::spawn_blocking(move || {
                    Journeys::new(&planner, prepared, vec![time])
                        .take(per_time_limit)
                        .collect::<Result<Vec<_>, _>>()
                })
            })
            .collect();

        let results = join_all(tasks).await;

        let mut itineraries = Vec::new();
        for result in results {
            match result {
                Ok(found) => itineraries.extend(found?),
                Err(e) => {
                    warn!(error = %e, "search task failed");
                    return Err(SearchError::TaskFailed(e.to_string()));
                }
            }
        }

        debug!(
            times = request.times.len(),
            found = itineraries.len(),
            "concurrent search complete"
        );
        Ok(rank_itineraries(deduplicate(itineraries)))
    }

    /// Least total edge cost from one station to another, ignoring the
    /// timetable.
    ///
    /// Uses scheduled running times, boarding overheads and neighbour walks.
    /// Returns `None` if no route connects them.
    pub fn cost_between(&self, from: &StationId, to: &StationId) -> Result<Option<u32>, SearchError> {
        let graph = self.network.graph();
        let start = graph
            .station(from)
            .ok_or_else(|| SearchError::UnknownStation(from.clone()))?;
        let goal = graph
            .station(to)
            .ok_or_else(|| SearchError::UnknownStation(to.clone()))?;

        let mut best: HashMap<NodeId, u32> = HashMap::from([(start, 0)]);
        let mut heap = BinaryHeap::from([Reverse((0u32, start))]);

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == goal {
                trace!(%from, %to, cost, "cost computed");
                return Ok(Some(cost));
            }
            if best.get(&node).is_some_and(|&b| cost > b) {
                continue;
            }
            for id in graph.outgoing(node) {
                let Some(edge) = graph.edge(id) else {
                    continue;
                };
                if !is_static(edge.kind()) {
                    continue;
                }
                let next = cost.saturating_add(edge.cost);
                if best.get(&edge.to).is_none_or(|&b| next < b) {
                    best.insert(edge.to, next);
                    heap.push(Reverse((next, edge.to)));
                }
            }
        }

        trace!(%from, %to, "no static route");
        Ok(None)
    }

    fn prepare(&self, request: &JourneyRequest) -> Result<PreparedQuery, SearchError> {
        request.validate()?;
        let modes = request.modes.as_ref();

        let origin = self.resolve(&request.origin, modes)?;
        let destination = self.resolve(&request.destination, modes)?;

        let graph = self.network.graph();
        let destination_stations: Vec<StationId> = match &destination {
            Resolved::Station(node) => graph
                .station_node(*node)
                .map(|s| s.id.clone())
                .into_iter()
                .collect(),
            Resolved::Location { walks, .. } => walks.iter().map(|(s, _)| s.clone()).collect(),
        };
        let targets = walking_targets(self.network.neighbours(), destination_stations);

        let direct_walk = match (&request.origin, &request.destination) {
            (Endpoint::Location(a), Endpoint::Location(b)) => {
                let distance = a.distance_m(b);
                (distance <= self.config.max_walk_distance_m)
                    .then(|| walk_minutes(distance, self.network.config().walking_speed_m_per_min))
            }
            _ => None,
        };

        let running = self.network.running_services(request.date);
        debug!(
            origin = ?request.origin,
            destination = ?request.destination,
            date = %request.date,
            times = request.times.len(),
            running = running.len(),
            targets = targets.len(),
            "journey query prepared"
        );

        Ok(PreparedQuery {
            context: Arc::new(QueryContext {
                running,
                targets,
                modes: request.modes.clone(),
            }),
            origin,
            destination,
            direct_walk,
        })
    }

    fn resolve(
        &self,
        endpoint: &Endpoint,
        modes: Option<&BTreeSet<TransportMode>>,
    ) -> Result<Resolved, SearchError> {
        let graph = self.network.graph();
        match endpoint {
            Endpoint::Station(id) => {
                let node = graph
                    .station(id)
                    .ok_or_else(|| SearchError::UnknownStation(id.clone()))?;
                if let (Some(modes), Some(station)) = (modes, graph.station_node(node)) {
                    if !station.modes.iter().any(|m| modes.contains(m)) {
                        return Err(SearchError::ModeMismatch {
                            station: id.clone(),
                        });
                    }
                }
                Ok(Resolved::Station(node))
            }
            Endpoint::Location(position) => {
                let walks = stations_within(
                    position,
                    graph.stations().map(|(_, s)| (&s.id, &s.position)),
                    self.config.max_walk_distance_m,
                    self.network.config().walking_speed_m_per_min,
                );
                Ok(Resolved::Location {
                    position: *position,
                    walks,
                })
            }
        }
    }
}

/// Edges of the untimed layer used for cost estimates.
fn is_static(kind: EdgeKind) -> bool {
    matches!(
        kind,
        EdgeKind::EnterPlatform
            | EdgeKind::LeavePlatform
            | EdgeKind::Board
            | EdgeKind::InterchangeBoard
            | EdgeKind::OnRoute
            | EdgeKind::Depart
            | EdgeKind::InterchangeDepart
            | EdgeKind::Neighbour
    )
}

/// Lazily planned itineraries for each candidate time in turn.
///
/// An itinerary already returned for an earlier time is not repeated. The
/// first search error ends the sequence.
pub struct Journeys<'p> {
    planner: &'p Planner,
    prepared: Arc<PreparedQuery>,
    times: std::vec::IntoIter<TransitTime>,
    engine: Option<TraversalEngine<'p, QueryOverlay<'p>>>,
    seen: HashSet<Vec<LegKey>>,
    diagnostics: Option<Diagnostics>,
    done: bool,
}

impl<'p> Journeys<'p> {
    fn new(planner: &'p Planner, prepared: Arc<PreparedQuery>, times: Vec<TransitTime>) -> Self {
        Self {
            planner,
            prepared,
            times: times.into_iter(),
            engine: None,
            seen: HashSet::new(),
            diagnostics: planner.config.diagnostics.then(Diagnostics::default),
            done: false,
        }
    }

    /// Rejection tallies of every finished search so far, when enabled in
    /// the search configuration.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    fn start(&self, time: TransitTime) -> TraversalEngine<'p, QueryOverlay<'p>> {
        let planner: &'p Planner = self.planner;
        let network: &'p TransportNetwork = &planner.network;
        let graph = network.graph();
        let prepared = &self.prepared;

        let mut overlay = QueryOverlay::new(graph);
        let origin = match &prepared.origin {
            Resolved::Station(node) => *node,
            Resolved::Location { position, walks } => {
                let point = overlay.add_query_point(*position);
                for (station, minutes) in walks {
                    if let Some(node) = graph.station(station) {
                        overlay.add_edge(point, node, *minutes, Relation::WalksTo);
                    }
                }
                point
            }
        };
        let destination = match &prepared.destination {
            Resolved::Station(node) => *node,
            Resolved::Location { position, walks } => {
                let point = overlay.add_query_point(*position);
                for (station, minutes) in walks {
                    if let Some(node) = graph.station(station) {
                        overlay.add_edge(node, point, *minutes, Relation::WalksFrom);
                    }
                }
                point
            }
        };
        if let Some(minutes) = prepared.direct_walk {
            overlay.add_edge(origin, destination, minutes, Relation::FinishWalk);
        }

        trace!(
            query_time = %time,
            nodes = overlay.added_nodes(),
            edges = overlay.added_edges(),
            "query overlay built"
        );
        TraversalEngine::new(
            overlay,
            network.reachability(),
            &planner.config,
            Arc::clone(&prepared.context),
            origin,
            destination,
            time,
        )
    }

    fn admit(&mut self, itinerary: &Itinerary) -> bool {
        self.seen.insert(itinerary.key())
    }

    fn retire(&mut self) {
        if let (Some(engine), Some(total)) = (self.engine.take(), self.diagnostics.as_mut()) {
            if let Some(found) = engine.diagnostics() {
                total.merge(found);
            }
        }
    }
}

impl Iterator for Journeys<'_> {
    type Item = Result<Itinerary, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.engine.is_none() {
                let Some(time) = self.times.next() else {
                    self.done = true;
                    return None;
                };
                self.engine = Some(self.start(time));
            }
            let Some(engine) = self.engine.as_mut() else {
                continue;
            };

            match engine.next() {
                Some(Ok(path)) => {
                    let itinerary = map_path(engine.graph(), &path);
                    if self.admit(&itinerary) {
                        return Some(Ok(itinerary));
                    }
                }
                Some(Err(e)) => {
                    self.retire();
                    self.done = true;
                    return Some(Err(e));
                }
                None => self.retire(),
            }
        }
    }
}
