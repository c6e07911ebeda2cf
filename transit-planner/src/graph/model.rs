//! Time-expanded graph model.
//!
//! Nodes and edges live in flat arenas indexed by [`NodeId`] and [`EdgeId`].
//! Cycles (loop routes, bidirectional walks) are ordinary data here; the
//! search engine is responsible for not running around them forever.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::iter::{Chain, Copied};
use std::slice::Iter;

use crate::domain::{
    LatLong, PlatformId, RouteId, ServiceId, StationId, TransitTime, TransportMode, TripId,
};

/// Index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Index of an edge in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A physical stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StationNode {
    pub id: StationId,
    pub name: String,
    pub modes: Vec<TransportMode>,
    pub position: LatLong,
    /// Changing between trips here is an interchange.
    pub interchange: bool,
}

/// A boarding point owned by a station.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformNode {
    pub id: PlatformId,
    pub station: StationId,
    pub position: LatLong,
}

/// Route R calls at station S.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStationNode {
    pub route: RouteId,
    pub station: StationId,
    pub mode: TransportMode,
}

/// Trips of one calendar service running between a pair of stations on a
/// route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNode {
    pub service: ServiceId,
    pub route: RouteId,
    pub from: StationId,
    pub to: StationId,
}

/// Departures of a service node within one hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourNode {
    pub service: ServiceId,
    pub from: StationId,
    pub hour: u32,
}

impl HourNode {
    /// First minute of the hour.
    pub fn start(&self) -> TransitTime {
        TransitTime::from_hm(self.hour, 0).unwrap_or(TransitTime::MAX)
    }

    /// Last minute of the hour.
    pub fn end(&self) -> TransitTime {
        TransitTime::from_hm(self.hour, 59).unwrap_or(TransitTime::MAX)
    }
}

/// One scheduled departure of a trip from a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteNode {
    pub trip: TripId,
    pub service: ServiceId,
    pub station: StationId,
    pub time: TransitTime,
}

/// A temporary walk origin or destination given as a location.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPointNode {
    pub position: LatLong,
}

/// A graph node, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Station(StationNode),
    Platform(PlatformNode),
    RouteStation(RouteStationNode),
    Service(ServiceNode),
    Hour(HourNode),
    Minute(MinuteNode),
    QueryPoint(QueryPointNode),
}

/// Node kind without payload, for counting and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Station,
    Platform,
    RouteStation,
    Service,
    Hour,
    Minute,
    QueryPoint,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Station(_) => NodeKind::Station,
            Node::Platform(_) => NodeKind::Platform,
            Node::RouteStation(_) => NodeKind::RouteStation,
            Node::Service(_) => NodeKind::Service,
            Node::Hour(_) => NodeKind::Hour,
            Node::Minute(_) => NodeKind::Minute,
            Node::QueryPoint(_) => NodeKind::QueryPoint,
        }
    }

    /// The station this node belongs to, where that is meaningful.
    pub fn station_id(&self) -> Option<&StationId> {
        match self {
            Node::Station(s) => Some(&s.id),
            Node::Platform(p) => Some(&p.station),
            Node::RouteStation(rs) => Some(&rs.station),
            Node::Minute(m) => Some(&m.station),
            Node::Service(_) | Node::Hour(_) | Node::QueryPoint(_) => None,
        }
    }
}

/// Natural keys for node lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Station(StationId),
    Platform(PlatformId),
    RouteStation(RouteId, StationId),
    Service {
        route: RouteId,
        service: ServiceId,
        from: StationId,
        to: StationId,
    },
    Hour {
        service_node: NodeId,
        hour: u32,
    },
    Minute {
        trip: TripId,
        station: StationId,
        time: TransitTime,
    },
}

/// What an edge means, with the data the search needs from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    Board { mode: TransportMode },
    InterchangeBoard { mode: TransportMode },
    Depart { mode: TransportMode },
    InterchangeDepart { mode: TransportMode },
    EnterPlatform,
    LeavePlatform,
    OnRoute { route: RouteId },
    ToService { trips: BTreeSet<TripId> },
    ToHour,
    ToMinute { trip: TripId },
    GoesTo {
        trip: TripId,
        service: ServiceId,
        mode: TransportMode,
    },
    WalksTo,
    WalksFrom,
    Neighbour,
    FinishWalk,
}

/// Edge kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Board,
    InterchangeBoard,
    Depart,
    InterchangeDepart,
    EnterPlatform,
    LeavePlatform,
    OnRoute,
    ToService,
    ToHour,
    ToMinute,
    GoesTo,
    WalksTo,
    WalksFrom,
    Neighbour,
    FinishWalk,
}

impl EdgeKind {
    pub fn is_boarding(self) -> bool {
        matches!(self, EdgeKind::Board | EdgeKind::InterchangeBoard)
    }

    pub fn is_departing(self) -> bool {
        matches!(self, EdgeKind::Depart | EdgeKind::InterchangeDepart)
    }

    /// Walking edges bypass all timetable checks.
    pub fn is_walk(self) -> bool {
        matches!(
            self,
            EdgeKind::WalksTo | EdgeKind::WalksFrom | EdgeKind::Neighbour | EdgeKind::FinishWalk
        )
    }
}

impl Relation {
    pub fn kind(&self) -> EdgeKind {
        match self {
            Relation::Board { .. } => EdgeKind::Board,
            Relation::InterchangeBoard { .. } => EdgeKind::InterchangeBoard,
            Relation::Depart { .. } => EdgeKind::Depart,
            Relation::InterchangeDepart { .. } => EdgeKind::InterchangeDepart,
            Relation::EnterPlatform => EdgeKind::EnterPlatform,
            Relation::LeavePlatform => EdgeKind::LeavePlatform,
            Relation::OnRoute { .. } => EdgeKind::OnRoute,
            Relation::ToService { .. } => EdgeKind::ToService,
            Relation::ToHour => EdgeKind::ToHour,
            Relation::ToMinute { .. } => EdgeKind::ToMinute,
            Relation::GoesTo { .. } => EdgeKind::GoesTo,
            Relation::WalksTo => EdgeKind::WalksTo,
            Relation::WalksFrom => EdgeKind::WalksFrom,
            Relation::Neighbour => EdgeKind::Neighbour,
            Relation::FinishWalk => EdgeKind::FinishWalk,
        }
    }

    /// Mode of a boarding or departing edge.
    pub fn mode(&self) -> Option<TransportMode> {
        match self {
            Relation::Board { mode }
            | Relation::InterchangeBoard { mode }
            | Relation::Depart { mode }
            | Relation::InterchangeDepart { mode }
            | Relation::GoesTo { mode, .. } => Some(*mode),
            _ => None,
        }
    }
}

/// A directed, typed edge with a cost in minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub cost: u32,
    pub relation: Relation,
}

impl Edge {
    pub fn kind(&self) -> EdgeKind {
        self.relation.kind()
    }
}

/// Outbound edge ids of a node, possibly spanning base graph and overlay.
pub type Outgoing<'a> = Chain<Copied<Iter<'a, EdgeId>>, Copied<Iter<'a, EdgeId>>>;

/// Read access to a graph, implemented by the built graph and by query
/// overlays layered over it.
pub trait GraphView {
    fn node(&self, id: NodeId) -> Option<&Node>;

    fn edge(&self, id: EdgeId) -> Option<&Edge>;

    fn outgoing(&self, id: NodeId) -> Outgoing<'_>;
}

impl<T: GraphView + ?Sized> GraphView for &T {
    fn node(&self, id: NodeId) -> Option<&Node> {
        (**self).node(id)
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        (**self).edge(id)
    }

    fn outgoing(&self, id: NodeId) -> Outgoing<'_> {
        (**self).outgoing(id)
    }
}

/// Node and edge counts per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: BTreeMap<NodeKind, usize>,
    pub edges: BTreeMap<EdgeKind, usize>,
}

impl GraphStats {
    pub fn nodes_of(&self, kind: NodeKind) -> usize {
        self.nodes.get(&kind).copied().unwrap_or(0)
    }

    pub fn edges_of(&self, kind: EdgeKind) -> usize {
        self.edges.get(&kind).copied().unwrap_or(0)
    }
}

/// The built, read-only transport graph.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    index: HashMap<NodeKey, NodeId>,
}

const NO_EDGES: &[EdgeId] = &[];

impl Graph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or return the existing node with the same key.
    pub(crate) fn get_or_insert(&mut self, key: NodeKey, make: impl FnOnce() -> Node) -> NodeId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(make());
        self.outgoing.push(Vec::new());
        self.index.insert(key, id);
        id
    }

    pub(crate) fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        cost: u32,
        relation: Relation,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            from,
            to,
            cost,
            relation,
        });
        if let Some(out) = self.outgoing.get_mut(from.0 as usize) {
            out.push(id);
        }
        id
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0 as usize)
    }

    /// Look up a node by natural key.
    pub fn find(&self, key: &NodeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Look up a station node.
    pub fn station(&self, id: &StationId) -> Option<NodeId> {
        self.find(&NodeKey::Station(id.clone()))
    }

    /// Look up a route-station node.
    pub fn route_station(&self, route: &RouteId, station: &StationId) -> Option<NodeId> {
        self.find(&NodeKey::RouteStation(route.clone(), station.clone()))
    }

    /// Station node payload, if `id` is a station.
    pub fn station_node(&self, id: NodeId) -> Option<&StationNode> {
        match self.nodes.get(id.0 as usize) {
            Some(Node::Station(s)) => Some(s),
            _ => None,
        }
    }

    /// All station nodes in insertion order.
    pub fn stations(&self) -> impl Iterator<Item = (NodeId, &StationNode)> {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Node::Station(s) => Some((NodeId(i as u32), s)),
            _ => None,
        })
    }

    /// All route-station nodes in insertion order.
    pub fn route_stations(&self) -> impl Iterator<Item = (NodeId, &RouteStationNode)> {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Node::RouteStation(rs) => Some((NodeId(i as u32), rs)),
            _ => None,
        })
    }

    /// All nodes with their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// All edges with their ids.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId(i as u32), e))
    }

    pub(crate) fn outgoing_slice(&self, id: NodeId) -> &[EdgeId] {
        self.outgoing
            .get(id.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(NO_EDGES)
    }

    /// Outbound edges of `id` with the given kind.
    pub fn outgoing_of_kind(&self, id: NodeId, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.outgoing_slice(id)
            .iter()
            .filter_map(|e| self.edges.get(e.0 as usize))
            .filter(move |e| e.kind() == kind)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Count nodes and edges per kind.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for node in &self.nodes {
            *stats.nodes.entry(node.kind()).or_default() += 1;
        }
        for edge in &self.edges {
            *stats.edges.entry(edge.kind()).or_default() += 1;
        }
        stats
    }
}

impl GraphView for Graph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize)
    }

    fn outgoing(&self, id: NodeId) -> Outgoing<'_> {
        self.outgoing_slice(id)
            .iter()
            .copied()
            .chain(NO_EDGES.iter().copied())
    }
}
