//! The time-expanded transport graph.
//!
//! Built once per timetable version by [`GraphBuilder`] and read-only
//! afterwards. Each scheduled departure gets its own node, layered under
//! per-service and per-hour nodes so the search can reject whole services or
//! hours before looking at individual departures.

mod builder;
mod config;
mod error;
mod interchange;
mod model;
mod overlay;

pub use builder::{BuiltGraph, GraphBuilder, ServiceSpan};
pub use config::{GraphConfig, ModeCosts};
pub use error::BuildError;
pub use interchange::{InterchangeReason, Interchanges};
pub use model::{
    Edge, EdgeId, EdgeKind, Graph, GraphStats, GraphView, HourNode, MinuteNode, Node, NodeId,
    NodeKey, NodeKind, Outgoing, PlatformNode, QueryPointNode, Relation, RouteStationNode,
    ServiceNode, StationNode,
};
pub use overlay::QueryOverlay;
