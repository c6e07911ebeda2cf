//! Depth-first search over the time-expanded graph.
//!
//! The engine owns an explicit stack of frames, one per node on the current
//! path. Each pull advances the search until a path reaches the destination
//! or the stack empties. Every candidate step is classified as:
//!
//! - `Reject`: a heuristic failed, the step is discarded.
//! - `Accept`: the step reaches the destination; the path is emitted and not
//!   expanded further.
//! - `Exploring`: the step is pushed and its node's outbound edges become
//!   candidates.
//!
//! Siblings are tried in edge order, except that edges continuing the trip
//! being ridden go first, and boarding edges onto the preferred route go
//! before other boarding edges.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::domain::{StationId, TransitTime, TransportMode};
use crate::graph::{Edge, EdgeId, EdgeKind, GraphView, Node, NodeId, NodeKind, Relation};

use super::calendar::RunningServices;
use super::config::SearchConfig;
use super::heuristics::{self, Admission, Diagnostics, RejectReason};
use super::reachability::Reachability;
use super::search::SearchError;
use super::state::{JourneyState, StateError};
use super::visited::VisitedCache;

/// Query-wide inputs shared by every search of one request.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Services running on the travel date.
    pub running: RunningServices,
    /// Stations from which the destination can be reached on foot (or the
    /// destination station itself).
    pub targets: HashSet<StationId>,
    /// Modes the traveller will board. `None` allows all.
    pub modes: Option<BTreeSet<TransportMode>>,
}

/// One traversed edge and the clock after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub edge: EdgeId,
    pub clock: TransitTime,
}

/// A path accepted by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundPath {
    pub query_time: TransitTime,
    pub steps: Vec<Step>,
    /// Sum of edge costs, excluding time spent waiting.
    pub total_cost: u32,
}

impl FoundPath {
    /// Clock on reaching the destination.
    pub fn arrival(&self) -> TransitTime {
        self.steps.last().map_or(self.query_time, |s| s.clock)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

struct Frame {
    node: NodeId,
    kind: NodeKind,
    state: JourneyState,
    total: u32,
    via: Option<Step>,
    via_kind: Option<EdgeKind>,
    children: Vec<EdgeId>,
    next: usize,
}

enum Outcome {
    Exploring(Frame),
    Accept { step: Step, total: u32 },
    Reject(RejectReason),
}

/// Nodes a path may pass through at most once.
fn is_place(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Station | NodeKind::Platform | NodeKind::QueryPoint
    )
}

/// A single search from one origin to one destination at one query time.
///
/// Iterating yields accepted paths lazily. The iterator is finite and ends
/// after the first state machine violation.
pub struct TraversalEngine<'n, G> {
    graph: G,
    reachability: &'n Reachability,
    config: &'n SearchConfig,
    query: Arc<QueryContext>,
    destination: NodeId,
    query_time: TransitTime,
    stack: Vec<Frame>,
    on_path: HashSet<NodeId>,
    visited: VisitedCache,
    diagnostics: Option<Diagnostics>,
    done: bool,
}

impl<'n, G: GraphView> TraversalEngine<'n, G> {
    pub fn new(
        graph: G,
        reachability: &'n Reachability,
        config: &'n SearchConfig,
        query: Arc<QueryContext>,
        origin: NodeId,
        destination: NodeId,
        query_time: TransitTime,
    ) -> Self {
        let mut engine = Self {
            graph,
            reachability,
            config,
            query,
            destination,
            query_time,
            stack: Vec::new(),
            on_path: HashSet::new(),
            visited: VisitedCache::new(),
            diagnostics: config.diagnostics.then(Diagnostics::default),
            done: false,
        };

        match engine.graph.node(origin).map(Node::kind) {
            Some(kind) => {
                let state = JourneyState::new(query_time);
                let children = engine.order_children(origin, &state);
                if is_place(kind) {
                    engine.on_path.insert(origin);
                }
                engine.stack.push(Frame {
                    node: origin,
                    kind,
                    state,
                    total: 0,
                    via: None,
                    via_kind: None,
                    children,
                    next: 0,
                });
            }
            None => engine.done = true,
        }
        engine
    }

    /// The graph being searched.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Rejection tallies, when enabled in the search configuration.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    /// Outbound edges of `node` in the order they should be tried.
    fn order_children(&self, node: NodeId, state: &JourneyState) -> Vec<EdgeId> {
        let mut ranked: Vec<(u8, EdgeId)> = self
            .graph
            .outgoing(node)
            .filter_map(|id| {
                let edge = self.graph.edge(id)?;
                // Running-time edges only serve reachability and cost estimates
                if edge.kind() == EdgeKind::OnRoute {
                    return None;
                }
                Some((self.rank(edge, state), id))
            })
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.into_iter().map(|(_, id)| id).collect()
    }

    fn rank(&self, edge: &Edge, state: &JourneyState) -> u8 {
        if let Some(trip) = state.current_trip() {
            let continues = match &edge.relation {
                Relation::ToService { trips } => trips.contains(trip),
                Relation::ToMinute { trip: t } => t == trip,
                _ => false,
            };
            return if continues { 0 } else { 1 };
        }
        if edge.kind().is_boarding() {
            if let (Some(preferred), Some(Node::RouteStation(rs))) =
                (&self.config.preferred_route, self.graph.node(edge.to))
            {
                return if &rs.route == preferred { 0 } else { 1 };
            }
        }
        1
    }

    /// Classify taking `edge_id` out of `parent`.
    fn step(&self, parent: &Frame, edge_id: EdgeId) -> Result<Outcome, StateError> {
        let Some(edge) = self.graph.edge(edge_id) else {
            return Ok(Outcome::Reject(RejectReason::Dangling));
        };
        let Some(node) = self.graph.node(edge.to) else {
            return Ok(Outcome::Reject(RejectReason::Dangling));
        };
        let kind = edge.kind();
        let max_wait = self.config.max_wait_mins;

        let admission = heuristics::path_length(self.stack.len(), self.config.max_path_length)
            .and_then(|| heuristics::reboard(parent.via_kind, kind))
            .and_then(|| heuristics::chained_walk(parent.via_kind, kind))
            .and_then(|| {
                heuristics::change_point(
                    kind,
                    parent.state.rides(),
                    self.reachability.changes_only_at_interchanges(),
                )
            })
            .and_then(|| heuristics::trip_continuity(parent.state.current_trip(), &edge.relation))
            .and_then(|| match edge.relation.mode() {
                Some(mode) if kind.is_boarding() => {
                    heuristics::mode_allowed(self.query.modes.as_ref(), mode)
                }
                _ => Admission::Admit,
            });
        if let Admission::Reject(reason) = admission {
            return Ok(Outcome::Reject(reason));
        }

        let total = parent.total.saturating_add(edge.cost);
        let mut state = match &edge.relation {
            Relation::Board { mode } | Relation::InterchangeBoard { mode } => {
                parent.state.board(*mode, total)?
            }
            Relation::Depart { .. } | Relation::InterchangeDepart { .. } => {
                parent.state.alight(total)?
            }
            _ => parent.state.advance_clock(total),
        };
        let clock = state.clock();
        let running = &self.query.running;

        let admission = match node {
            Node::Station(_) | Node::Platform(_) | Node::QueryPoint(_) => {
                if self.on_path.contains(&edge.to) {
                    Admission::Reject(RejectReason::Revisit)
                } else {
                    Admission::Admit
                }
            }
            Node::RouteStation(_) => {
                heuristics::destination_reachable(self.reachability, edge.to, &self.query.targets)
            }
            Node::Service(service) => heuristics::calendar(running, &service.service).and_then(
                || heuristics::service_window(running.span(&service.service), clock, max_wait),
            ),
            Node::Hour(hour) => heuristics::hour_window(hour, clock, max_wait).and_then(|| {
                if self.visited.should_skip(edge.to, NodeKind::Hour, clock) {
                    Admission::Reject(RejectReason::Visited)
                } else {
                    Admission::Admit
                }
            }),
            Node::Minute(minute) => {
                let admission = if self.visited.should_skip(edge.to, NodeKind::Minute, clock) {
                    Admission::Reject(RejectReason::Visited)
                } else {
                    Admission::Admit
                };
                admission
                    .and_then(|| heuristics::calendar(running, &minute.service))
                    .and_then(|| heuristics::minute_window(minute.time, clock, max_wait))
            }
        };
        if let Admission::Reject(reason) = admission {
            return Ok(Outcome::Reject(reason));
        }

        if let Node::Minute(minute) = node {
            state = state.record_departure(minute.time, &minute.trip, total)?;
        }

        let step = Step {
            edge: edge_id,
            clock: state.clock(),
        };
        if edge.to == self.destination {
            return Ok(Outcome::Accept { step, total });
        }

        let children = self.order_children(edge.to, &state);
        Ok(Outcome::Exploring(Frame {
            node: edge.to,
            kind: node.kind(),
            state,
            total,
            via: Some(step),
            via_kind: Some(kind),
            children,
            next: 0,
        }))
    }

    fn accepted_path(&self, last: Step, total: u32) -> FoundPath {
        let steps = self
            .stack
            .iter()
            .filter_map(|f| f.via)
            .chain(std::iter::once(last))
            .collect();
        FoundPath {
            query_time: self.query_time,
            steps,
            total_cost: total,
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.stack.clear();
        match &self.diagnostics {
            Some(d) => debug!(
                query_time = %self.query_time,
                expanded = d.expanded,
                accepted = d.accepted,
                rejected = ?d.rejected,
                "search exhausted"
            ),
            None => debug!(query_time = %self.query_time, visited = self.visited.len(), "search exhausted"),
        }
    }
}

impl<G: GraphView> Iterator for TraversalEngine<'_, G> {
    type Item = Result<FoundPath, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(top) = self.stack.last_mut() else {
                self.finish();
                return None;
            };
            let Some(edge_id) = top.children.get(top.next).copied() else {
                if let Some(frame) = self.stack.pop() {
                    self.on_path.remove(&frame.node);
                }
                continue;
            };
            top.next += 1;

            let Some(parent) = self.stack.last() else {
                continue;
            };
            let outcome = match self.step(parent, edge_id) {
                Ok(outcome) => outcome,
                Err(e) => {
                    debug!(error = %e, query_time = %self.query_time, "search aborted");
                    self.done = true;
                    self.stack.clear();
                    return Some(Err(e.into()));
                }
            };

            match outcome {
                Outcome::Reject(reason) => {
                    if let Some(d) = &mut self.diagnostics {
                        d.reject(reason);
                    }
                }
                Outcome::Accept { step, total } => {
                    if let Some(d) = &mut self.diagnostics {
                        d.accepted += 1;
                    }
                    let path = self.accepted_path(step, total);
                    trace!(cost = path.total_cost, edges = path.len(), arrival = %path.arrival(), "path accepted");
                    return Some(Ok(path));
                }
                Outcome::Exploring(frame) => {
                    if let Some(d) = &mut self.diagnostics {
                        d.expanded += 1;
                    }
                    // An hour reached while riding only admits that trip's
                    // departure, so it says nothing about a later free visit
                    if frame.kind != NodeKind::Hour || frame.state.current_trip().is_none() {
                        self.visited
                            .record(frame.node, frame.kind, frame.state.clock());
                    }
                    if is_place(frame.kind) {
                        self.on_path.insert(frame.node);
                    }
                    self.stack.push(frame);
                }
            }
        }
    }
}
