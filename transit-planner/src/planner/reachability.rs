//! Same-route reachability, precomputed once per network.
//!
//! For every route-station we follow ON_ROUTE edges of that route only. If a
//! change point is met further along, the destination may be reachable by
//! changing there, so the answer is just "yes". Otherwise the full set of
//! stations reachable without changing is kept, and the search admits the
//! route-station only if that set contains a destination station.
//!
//! Which stations are change points depends on the network's change rule.
//! With changes limited to interchanges, they are the interchanges and the
//! stations with an interchange one walk away. Otherwise any station served
//! by another route, or one walk away from a served station, is one too.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::time::Instant;

use tracing::info;

use crate::domain::StationId;
use crate::graph::{EdgeKind, Graph, GraphConfig, GraphView, Interchanges, Node, NodeId, Relation};
use crate::walkable::WalkableConnections;

/// What a route-station can reach without changing vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteReach {
    /// A station where the traveller may change lies ahead on the same route.
    Interchange,
    /// Every station reachable on the same route, including the start.
    Stations(BTreeSet<StationId>),
}

/// Reachability of every route-station in a graph.
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    reach: HashMap<NodeId, RouteReach>,
    interchange_only: bool,
}

impl Reachability {
    pub fn compute(
        graph: &Graph,
        interchanges: &Interchanges,
        neighbours: &WalkableConnections,
        config: &GraphConfig,
    ) -> Self {
        let started = Instant::now();
        let interchange_only = config.change_at_interchange_only;
        let changes = change_points(graph, interchanges, neighbours, interchange_only);

        let mut reach = HashMap::new();
        let mut via_interchange = 0usize;
        for (id, route_station) in graph.route_stations() {
            let found = explore(graph, &changes, id, route_station.station.clone());
            if found == RouteReach::Interchange {
                via_interchange += 1;
            }
            reach.insert(id, found);
        }

        info!(
            route_stations = reach.len(),
            change_points = changes.len(),
            via_interchange,
            interchange_only,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reachability computed"
        );
        Self {
            reach,
            interchange_only,
        }
    }

    /// Whether a second boarding must happen at an interchange.
    pub fn changes_only_at_interchanges(&self) -> bool {
        self.interchange_only
    }

    /// True if a change point lies ahead on the same route.
    pub fn interchange_reachable(&self, route_station: NodeId) -> bool {
        matches!(self.reach.get(&route_station), Some(RouteReach::Interchange))
    }

    /// Stations reachable on the same route, when no change point is.
    pub fn reachable_stations(&self, route_station: NodeId) -> Option<&BTreeSet<StationId>> {
        match self.reach.get(&route_station) {
            Some(RouteReach::Stations(stations)) => Some(stations),
            _ => None,
        }
    }

    /// True if any of `targets` may still be reached from `route_station`.
    ///
    /// Route-stations not in the table (for example, none at all in an
    /// empty graph) are admitted.
    pub fn admits(&self, route_station: NodeId, targets: &HashSet<StationId>) -> bool {
        match self.reach.get(&route_station) {
            None | Some(RouteReach::Interchange) => true,
            Some(RouteReach::Stations(stations)) => stations.iter().any(|s| targets.contains(s)),
        }
    }

    /// The same change rule with nothing pruned.
    #[cfg(test)]
    pub(crate) fn without_pruning(&self) -> Self {
        Self {
            reach: HashMap::new(),
            interchange_only: self.interchange_only,
        }
    }

    pub fn len(&self) -> usize {
        self.reach.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reach.is_empty()
    }
}

/// Stations where a traveller may get off one route and go on by another.
fn change_points(
    graph: &Graph,
    interchanges: &Interchanges,
    neighbours: &WalkableConnections,
    interchange_only: bool,
) -> HashSet<StationId> {
    let mut routes_at: HashMap<&StationId, usize> = HashMap::new();
    for (_, route_station) in graph.route_stations() {
        *routes_at.entry(&route_station.station).or_default() += 1;
    }
    // Somewhere a walk could end and a new ride begin
    let boards_here = |station: &StationId| {
        if interchange_only {
            interchanges.is_interchange(station)
        } else {
            routes_at.contains_key(station)
        }
    };

    graph
        .stations()
        .map(|(_, station)| &station.id)
        .filter(|id| {
            interchanges.is_interchange(id)
                || (!interchange_only && routes_at.get(id).is_some_and(|&n| n >= 2))
                || neighbours.neighbours_of(id).any(|(next, _)| boards_here(next))
        })
        .cloned()
        .collect()
}

fn explore(
    graph: &Graph,
    changes: &HashSet<StationId>,
    start: NodeId,
    start_station: StationId,
) -> RouteReach {
    let Some(Node::RouteStation(origin)) = graph.node(start) else {
        return RouteReach::Stations(BTreeSet::new());
    };
    let route = &origin.route;

    let mut stations = BTreeSet::new();
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, start_station)]);

    while let Some((node, station)) = queue.pop_front() {
        // Boarded here, so getting off here again is never a change
        if node != start && changes.contains(&station) {
            return RouteReach::Interchange;
        }
        stations.insert(station);

        for edge in graph.outgoing_of_kind(node, EdgeKind::OnRoute) {
            let Relation::OnRoute { route: edge_route } = &edge.relation else {
                continue;
            };
            if edge_route != route || !seen.insert(edge.to) {
                continue;
            }
            if let Some(Node::RouteStation(next)) = graph.node(edge.to) {
                queue.push_back((edge.to, next.station.clone()));
            }
        }
    }

    RouteReach::Stations(stations)
}

/// `seeds` plus their walking neighbours.
///
/// Walks are never chained, so one hop covers every station a traveller
/// can alight at and still walk to a seed.
pub fn walking_targets(
    neighbours: &WalkableConnections,
    seeds: impl IntoIterator<Item = StationId>,
) -> HashSet<StationId> {
    let mut targets = HashSet::new();
    for seed in seeds {
        targets.extend(neighbours.neighbours_of(&seed).map(|(next, _)| next.clone()));
        targets.insert(seed);
    }
    targets
}
