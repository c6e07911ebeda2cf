//! Per-query memo of explored hour and minute nodes.
//!
//! A minute node's departure time is part of its identity, so a second
//! visit can only repeat the first. An hour node revisited at the same clock
//! admits exactly the same departures as before. Other node kinds are never
//! recorded.

use std::collections::HashMap;

use crate::domain::TransitTime;
use crate::graph::{NodeId, NodeKind};

#[derive(Debug, Default)]
pub struct VisitedCache {
    visits: HashMap<NodeId, TransitTime>,
}

impl VisitedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if visiting `node` at `clock` would repeat an earlier visit.
    pub fn should_skip(&self, node: NodeId, kind: NodeKind, clock: TransitTime) -> bool {
        match kind {
            NodeKind::Minute => self.visits.contains_key(&node),
            NodeKind::Hour => self.visits.get(&node) == Some(&clock),
            _ => false,
        }
    }

    /// Record a successful visit.
    pub fn record(&mut self, node: NodeId, kind: NodeKind, clock: TransitTime) {
        if matches!(kind, NodeKind::Hour | NodeKind::Minute) {
            self.visits.insert(node, clock);
        }
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}
