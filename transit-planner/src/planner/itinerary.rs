//! Folding accepted paths into itineraries.
//!
//! A path is a sequence of edges; an itinerary is a sequence of legs. A
//! vehicle leg runs from a boarding edge to the next depart edge, collecting
//! the trip, the caught departure and the stops passed on the way. Each
//! walking edge becomes a walk leg of its own.

use std::fmt;

use crate::domain::{
    LatLong, PlatformId, RouteId, ServiceId, StationId, TransitTime, TransportMode, TripId,
};
use crate::graph::{GraphView, Node, NodeId, Relation};

use super::traversal::FoundPath;

/// Where a walk starts or ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Station(StationId),
    Location(LatLong),
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Station(id) => write!(f, "{id}"),
            Place::Location(p) => write!(f, "({:.5}, {:.5})", p.lat, p.lon),
        }
    }
}

/// A ride on one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleLeg {
    pub mode: TransportMode,
    pub route: RouteId,
    pub trip: TripId,
    pub service: ServiceId,
    pub board: StationId,
    pub board_platform: Option<PlatformId>,
    pub alight: StationId,
    pub alight_platform: Option<PlatformId>,
    pub departs: TransitTime,
    pub arrives: TransitTime,
    /// Intermediate stops passed without alighting.
    pub passed_stops: usize,
    /// Edge costs from boarding to alighting, overheads included.
    pub cost: u32,
}

/// A walk between two places.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkLeg {
    pub from: Place,
    pub to: Place,
    pub departs: TransitTime,
    pub arrives: TransitTime,
    pub cost: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Leg {
    Vehicle(VehicleLeg),
    Walk(WalkLeg),
}

impl Leg {
    pub fn departs(&self) -> TransitTime {
        match self {
            Leg::Vehicle(v) => v.departs,
            Leg::Walk(w) => w.departs,
        }
    }

    pub fn arrives(&self) -> TransitTime {
        match self {
            Leg::Vehicle(v) => v.arrives,
            Leg::Walk(w) => w.arrives,
        }
    }

    pub fn cost(&self) -> u32 {
        match self {
            Leg::Vehicle(v) => v.cost,
            Leg::Walk(w) => w.cost,
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Vehicle(v) => write!(
                f,
                "{} {} {} {} -> {} {} ({} stops)",
                v.departs, v.mode, v.route, v.board, v.alight, v.arrives, v.passed_stops
            ),
            Leg::Walk(w) => write!(f, "{} walk {} -> {} {}", w.departs, w.from, w.to, w.arrives),
        }
    }
}

/// Identity of an itinerary for de-duplication across query times.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum LegKey {
    Vehicle {
        trip: TripId,
        board: StationId,
        alight: StationId,
        departs: TransitTime,
    },
    Walk {
        from: Option<StationId>,
        to: Option<StationId>,
        departs: TransitTime,
    },
}

/// A complete journey from origin to destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    /// The candidate time the search started from.
    pub query_time: TransitTime,
    pub legs: Vec<Leg>,
    /// Sum of edge costs, excluding waiting.
    pub total_cost: u32,
}

impl Itinerary {
    /// Departure of the first leg.
    pub fn departs(&self) -> TransitTime {
        self.legs.first().map_or(self.query_time, Leg::departs)
    }

    /// Arrival of the last leg.
    pub fn arrives(&self) -> TransitTime {
        self.legs.last().map_or(self.query_time, Leg::arrives)
    }

    /// Minutes from the query time to arrival.
    pub fn duration_mins(&self) -> u32 {
        self.arrives().minutes_since(self.query_time).max(0) as u32
    }

    pub fn vehicle_legs(&self) -> impl Iterator<Item = &VehicleLeg> {
        self.legs.iter().filter_map(|l| match l {
            Leg::Vehicle(v) => Some(v),
            Leg::Walk(_) => None,
        })
    }

    /// Number of vehicle changes.
    pub fn changes(&self) -> usize {
        self.vehicle_legs().count().saturating_sub(1)
    }

    pub(crate) fn key(&self) -> Vec<LegKey> {
        self.legs
            .iter()
            .map(|leg| match leg {
                Leg::Vehicle(v) => LegKey::Vehicle {
                    trip: v.trip.clone(),
                    board: v.board.clone(),
                    alight: v.alight.clone(),
                    departs: v.departs,
                },
                Leg::Walk(w) => LegKey::Walk {
                    from: station_of(&w.from),
                    to: station_of(&w.to),
                    departs: w.departs,
                },
            })
            .collect()
    }
}

fn station_of(place: &Place) -> Option<StationId> {
    match place {
        Place::Station(id) => Some(id.clone()),
        Place::Location(_) => None,
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} -> {} ({} mins, cost {}, {} changes)",
            self.departs(),
            self.arrives(),
            self.duration_mins(),
            self.total_cost,
            self.changes()
        )?;
        for leg in &self.legs {
            writeln!(f, "  {leg}")?;
        }
        Ok(())
    }
}

/// A vehicle leg being assembled.
struct OpenLeg {
    mode: TransportMode,
    route: RouteId,
    board: StationId,
    board_platform: Option<PlatformId>,
    caught: Option<(TripId, ServiceId, TransitTime)>,
    hops: usize,
    cost: u32,
    arrives: TransitTime,
}

fn place_of<G: GraphView>(graph: &G, node: NodeId) -> Option<Place> {
    match graph.node(node)? {
        Node::Station(s) => Some(Place::Station(s.id.clone())),
        Node::Platform(p) => Some(Place::Station(p.station.clone())),
        Node::QueryPoint(q) => Some(Place::Location(q.position)),
        other => other.station_id().cloned().map(Place::Station),
    }
}

fn platform_of<G: GraphView>(graph: &G, node: NodeId) -> Option<PlatformId> {
    match graph.node(node)? {
        Node::Platform(p) => Some(p.id.clone()),
        _ => None,
    }
}

/// Fold an accepted path into legs.
///
/// Edges that do not resolve in `graph` are skipped; a vehicle leg left open
/// at the end of the path is dropped.
pub fn map_path<G: GraphView>(graph: &G, path: &FoundPath) -> Itinerary {
    let mut legs = Vec::new();
    let mut open: Option<OpenLeg> = None;
    let mut clock = path.query_time;

    for step in &path.steps {
        let Some(edge) = graph.edge(step.edge) else {
            continue;
        };
        let kind = edge.kind();

        match &edge.relation {
            _ if kind.is_walk() => {
                if let (Some(from), Some(to)) = (place_of(graph, edge.from), place_of(graph, edge.to))
                {
                    legs.push(Leg::Walk(WalkLeg {
                        from,
                        to,
                        departs: clock,
                        arrives: step.clock,
                        cost: edge.cost,
                    }));
                }
            }
            Relation::Board { mode } | Relation::InterchangeBoard { mode } => {
                if let Some(Node::RouteStation(rs)) = graph.node(edge.to) {
                    open = Some(OpenLeg {
                        mode: *mode,
                        route: rs.route.clone(),
                        board: rs.station.clone(),
                        board_platform: platform_of(graph, edge.from),
                        caught: None,
                        hops: 0,
                        cost: edge.cost,
                        arrives: step.clock,
                    });
                }
            }
            Relation::ToMinute { .. } => {
                if let Some(leg) = open.as_mut() {
                    leg.cost += edge.cost;
                    if let (None, Some(Node::Minute(minute))) = (&leg.caught, graph.node(edge.to)) {
                        leg.caught = Some((minute.trip.clone(), minute.service.clone(), minute.time));
                    }
                }
            }
            Relation::GoesTo { .. } => {
                if let Some(leg) = open.as_mut() {
                    leg.cost += edge.cost;
                    leg.hops += 1;
                    leg.arrives = step.clock;
                }
            }
            Relation::Depart { .. } | Relation::InterchangeDepart { .. } => {
                let alight = match graph.node(edge.from) {
                    Some(Node::RouteStation(rs)) => Some(rs.station.clone()),
                    _ => None,
                };
                if let (Some(leg), Some(alight)) = (open.take(), alight) {
                    if let Some((trip, service, departs)) = leg.caught {
                        legs.push(Leg::Vehicle(VehicleLeg {
                            mode: leg.mode,
                            route: leg.route,
                            trip,
                            service,
                            board: leg.board,
                            board_platform: leg.board_platform,
                            alight,
                            alight_platform: platform_of(graph, edge.to),
                            departs,
                            arrives: leg.arrives,
                            passed_stops: leg.hops.saturating_sub(1),
                            cost: leg.cost + edge.cost,
                        }));
                    }
                }
            }
            _ => {
                if let Some(leg) = open.as_mut() {
                    leg.cost += edge.cost;
                }
            }
        }
        clock = step.clock;
    }

    Itinerary {
        query_time: path.query_time,
        legs,
        total_cost: path.total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{station_id, time};

    fn vehicle(trip: &str, board: &str, alight: &str, departs: &str, arrives: &str) -> Leg {
        Leg::Vehicle(VehicleLeg {
            mode: TransportMode::Tram,
            route: RouteId::parse("R1").unwrap(),
            trip: TripId::parse(trip).unwrap(),
            service: ServiceId::parse("WKDY").unwrap(),
            board: station_id(board),
            board_platform: None,
            alight: station_id(alight),
            alight_platform: None,
            departs: time(departs),
            arrives: time(arrives),
            passed_stops: 0,
            cost: 10,
        })
    }

    fn walk(from: &str, to: &str, departs: &str, arrives: &str) -> Leg {
        Leg::Walk(WalkLeg {
            from: Place::Station(station_id(from)),
            to: Place::Station(station_id(to)),
            departs: time(departs),
            arrives: time(arrives),
            cost: 4,
        })
    }

    #[test]
    fn summary_accessors() {
        let itinerary = Itinerary {
            query_time: time("07:55"),
            legs: vec![
                vehicle("T1", "A", "B", "08:00", "08:10"),
                walk("B", "C", "08:11", "08:15"),
                vehicle("T7", "C", "D", "08:20", "08:40"),
            ],
            total_cost: 30,
        };

        assert_eq!(itinerary.departs(), time("08:00"));
        assert_eq!(itinerary.arrives(), time("08:40"));
        assert_eq!(itinerary.duration_mins(), 45);
        assert_eq!(itinerary.changes(), 1);
        assert_eq!(itinerary.vehicle_legs().count(), 2);
    }

    #[test]
    fn key_ignores_query_time() {
        let a = Itinerary {
            query_time: time("07:55"),
            legs: vec![vehicle("T1", "A", "B", "08:00", "08:10")],
            total_cost: 12,
        };
        let b = Itinerary {
            query_time: time("07:58"),
            total_cost: 12,
            ..a.clone()
        };
        let c = Itinerary {
            legs: vec![vehicle("T2", "A", "B", "08:30", "08:40")],
            ..a.clone()
        };

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn empty_itinerary_uses_query_time() {
        let empty = Itinerary {
            query_time: time("09:00"),
            legs: vec![],
            total_cost: 0,
        };
        assert_eq!(empty.departs(), time("09:00"));
        assert_eq!(empty.arrives(), time("09:00"));
        assert_eq!(empty.changes(), 0);
    }

    #[test]
    fn display() {
        let itinerary = Itinerary {
            query_time: time("07:55"),
            legs: vec![
                vehicle("T1", "A", "B", "08:00", "08:10"),
                walk("B", "C", "08:11", "08:15"),
            ],
            total_cost: 14,
        };
        let text = itinerary.to_string();
        assert!(text.starts_with("08:00 -> 08:15 (20 mins, cost 14, 0 changes)"));
        assert!(text.contains("08:00 tram R1 A -> B 08:10 (0 stops)"));
        assert!(text.contains("08:11 walk B -> C 08:15"));
    }
}
