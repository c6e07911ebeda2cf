//! Query-scoped additions to the shared graph.
//!
//! A journey that starts or ends at a location rather than a station needs a
//! node for that location and walking edges to nearby stations. The built
//! graph is shared read-only between concurrent queries, so these live in an
//! overlay owned by the query. Dropping the overlay removes them.

use std::collections::HashMap;

use tracing::trace;

use super::model::{Edge, EdgeId, Graph, GraphView, Node, NodeId, Outgoing, QueryPointNode, Relation};
use crate::domain::LatLong;

/// Nodes and edges layered over a base graph for one query.
///
/// Overlay ids continue after the base graph's ids, so base and overlay
/// elements can be addressed uniformly through [`GraphView`].
#[derive(Debug)]
pub struct QueryOverlay<'g> {
    base: &'g Graph,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
}

impl<'g> QueryOverlay<'g> {
    /// An empty overlay over `base`.
    pub fn new(base: &'g Graph) -> Self {
        Self {
            base,
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: HashMap::new(),
        }
    }

    /// The shared graph underneath.
    pub fn base(&self) -> &'g Graph {
        self.base
    }

    /// Add a location node.
    pub fn add_query_point(&mut self, position: LatLong) -> NodeId {
        let id = NodeId((self.base.node_count() + self.nodes.len()) as u32);
        self.nodes
            .push(Node::QueryPoint(QueryPointNode { position }));
        id
    }

    /// Add an edge between any two nodes of the base graph or the overlay.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, cost: u32, relation: Relation) -> EdgeId {
        let id = EdgeId((self.base.edge_count() + self.edges.len()) as u32);
        self.edges.push(Edge {
            from,
            to,
            cost,
            relation,
        });
        self.outgoing.entry(from).or_default().push(id);
        id
    }

    /// Number of nodes added on top of the base graph.
    pub fn added_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges added on top of the base graph.
    pub fn added_edges(&self) -> usize {
        self.edges.len()
    }
}

impl GraphView for QueryOverlay<'_> {
    fn node(&self, id: NodeId) -> Option<&Node> {
        let index = id.0 as usize;
        let base_count = self.base.node_count();
        if index < base_count {
            self.base.node(id)
        } else {
            self.nodes.get(index - base_count)
        }
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        let index = id.0 as usize;
        let base_count = self.base.edge_count();
        if index < base_count {
            self.base.edge(id)
        } else {
            self.edges.get(index - base_count)
        }
    }

    fn outgoing(&self, id: NodeId) -> Outgoing<'_> {
        let extra = self.outgoing.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        self.base
            .outgoing_slice(id)
            .iter()
            .copied()
            .chain(extra.iter().copied())
    }
}

impl Drop for QueryOverlay<'_> {
    fn drop(&mut self) {
        if !self.nodes.is_empty() || !self.edges.is_empty() {
            trace!(
                nodes = self.nodes.len(),
                edges = self.edges.len(),
                "query overlay removed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StationId;
    use crate::graph::model::{NodeKey, StationNode};
    use crate::domain::TransportMode;

    fn base() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let id = StationId::parse("A").unwrap();
        let a = graph.get_or_insert(NodeKey::Station(id.clone()), || {
            Node::Station(StationNode {
                id,
                name: "A".into(),
                modes: vec![TransportMode::Bus],
                position: LatLong::new(53.0, -2.0),
                interchange: false,
            })
        });
        (graph, a)
    }

    #[test]
    fn overlay_ids_follow_base_ids() {
        let (graph, a) = base();
        let mut overlay = QueryOverlay::new(&graph);

        let point = overlay.add_query_point(LatLong::new(53.001, -2.0));
        assert_eq!(point, NodeId(1));
        assert!(matches!(overlay.node(point), Some(Node::QueryPoint(_))));
        assert!(matches!(overlay.node(a), Some(Node::Station(_))));
        assert!(overlay.node(NodeId(2)).is_none());
    }

    #[test]
    fn overlay_edges_extend_base_adjacency() {
        let (graph, a) = base();
        let mut overlay = QueryOverlay::new(&graph);
        let point = overlay.add_query_point(LatLong::new(53.001, -2.0));

        let to_station = overlay.add_edge(point, a, 2, Relation::WalksTo);
        let from_station = overlay.add_edge(a, point, 2, Relation::WalksFrom);

        assert_eq!(overlay.outgoing(point).collect::<Vec<_>>(), vec![to_station]);
        assert_eq!(overlay.outgoing(a).collect::<Vec<_>>(), vec![from_station]);
        assert_eq!(overlay.edge(to_station).unwrap().to, a);

        // The base graph is untouched
        assert_eq!(graph.outgoing(a).count(), 0);
    }

    #[test]
    fn dropping_overlay_leaves_base_intact() {
        let (graph, a) = base();
        {
            let mut overlay = QueryOverlay::new(&graph);
            let point = overlay.add_query_point(LatLong::new(53.001, -2.0));
            overlay.add_edge(point, a, 2, Relation::WalksTo);
            assert_eq!(overlay.added_nodes(), 1);
            assert_eq!(overlay.added_edges(), 1);
        }
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }
}
