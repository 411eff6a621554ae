//! Bridge-graph node and edge shapes.
//!
//! # Responsibility
//! - Hold the induced subgraph handed to force-layout renderers.
//! - Deduplicate nodes by id and edges by `(source_id, target_id, kind)`.
//!
//! # Invariants
//! - Iteration order is insertion order, so repeated derivations are
//!   reproducible.
//! - An edge may name a node that was never added; renderers decide how to
//!   draw it. Expanders in this crate only add edges between added nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which taxonomy a graph node comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Defensive technique.
    Defensive,
    /// Offensive technique from a cross-mapping.
    Offensive,
    /// Digital artifact.
    Artifact,
}

impl NodeKind {
    /// Stable string label used across the FFI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defensive => "defensive",
            Self::Offensive => "offensive",
            Self::Artifact => "artifact",
        }
    }
}

/// Relationship carried by one graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Defensive technique -> artifact it operates on.
    DefensiveToArtifact,
    /// Offensive technique -> artifact it targets.
    OffensiveToArtifact,
}

impl EdgeKind {
    /// Stable string label used across the FFI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefensiveToArtifact => "defensive_to_artifact",
            Self::OffensiveToArtifact => "offensive_to_artifact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub display_name: String,
    pub kind: NodeKind,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind,
        }
    }

    /// Returns whether `node_id` is either endpoint.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

/// Edges and neighbors adjacent to one focused node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHighlight {
    pub node_id: String,
    pub edges: Vec<GraphEdge>,
    /// Opposite endpoints of `edges`, deduplicated, focused node excluded.
    pub neighbor_ids: Vec<String>,
}

/// Node/edge sets of one bridge-graph view.
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_ids: HashSet<String>,
    edge_keys: HashSet<GraphEdge>,
}

impl NeighborhoodGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node unless one with the same id exists.
    ///
    /// Returns `true` when the node was inserted.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if !self.node_ids.insert(node.id.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Adds an edge unless the same `(source, target, kind)` exists.
    ///
    /// Returns `true` when the edge was inserted.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if self.edge_keys.contains(&edge) {
            return false;
        }
        self.edge_keys.insert(edge.clone());
        self.edges.push(edge);
        true
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, node_id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node_ids.contains(node_id)
    }

    pub fn contains_edge(&self, source_id: &str, target_id: &str, kind: EdgeKind) -> bool {
        self.edge_keys
            .contains(&GraphEdge::new(source_id, target_id, kind))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the edges and neighbors adjacent to `node_id`.
    ///
    /// Returns `None` when the node is not part of this graph.
    pub fn incident(&self, node_id: &str) -> Option<NodeHighlight> {
        if !self.contains_node(node_id) {
            return None;
        }

        let edges = self
            .edges
            .iter()
            .filter(|edge| edge.touches(node_id))
            .cloned()
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        let mut neighbor_ids = Vec::new();
        for edge in &edges {
            for endpoint in [&edge.source_id, &edge.target_id] {
                if endpoint != node_id && seen.insert(endpoint.clone()) {
                    neighbor_ids.push(endpoint.clone());
                }
            }
        }

        Some(NodeHighlight {
            node_id: node_id.to_string(),
            edges,
            neighbor_ids,
        })
    }
}

/// Set equality: same node ids and same edge keys, order ignored.
impl PartialEq for NeighborhoodGraph {
    fn eq(&self, other: &Self) -> bool {
        self.node_ids == other.node_ids && self.edge_keys == other.edge_keys
    }
}

impl Eq for NeighborhoodGraph {}

#[cfg(test)]
mod tests {
    use super::{EdgeKind, GraphEdge, GraphNode, NeighborhoodGraph, NodeKind};

    fn node(id: &str, kind: NodeKind) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            display_name: id.to_string(),
            kind,
            description: String::new(),
        }
    }

    #[test]
    fn deduplicates_nodes_by_id() {
        let mut graph = NeighborhoodGraph::new();
        assert!(graph.add_node(node("DA-04", NodeKind::Artifact)));
        assert!(!graph.add_node(node("DA-04", NodeKind::Artifact)));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn deduplicates_edges_by_source_target_kind() {
        let mut graph = NeighborhoodGraph::new();
        let edge = GraphEdge::new("T1003", "DA-04", EdgeKind::OffensiveToArtifact);
        assert!(graph.add_edge(edge.clone()));
        assert!(!graph.add_edge(edge));
        assert!(graph.add_edge(GraphEdge::new(
            "T1003",
            "DA-04",
            EdgeKind::DefensiveToArtifact
        )));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn incident_lists_adjacent_edges_and_neighbors() {
        let mut graph = NeighborhoodGraph::new();
        graph.add_node(node("D3-CH", NodeKind::Defensive));
        graph.add_node(node("DA-04", NodeKind::Artifact));
        graph.add_node(node("T1003", NodeKind::Offensive));
        graph.add_edge(GraphEdge::new("D3-CH", "DA-04", EdgeKind::DefensiveToArtifact));
        graph.add_edge(GraphEdge::new("T1003", "DA-04", EdgeKind::OffensiveToArtifact));

        let highlight = graph.incident("DA-04").expect("artifact is in graph");
        assert_eq!(highlight.edges.len(), 2);
        assert_eq!(highlight.neighbor_ids, vec!["D3-CH", "T1003"]);

        let leaf = graph.incident("T1003").expect("offensive node is in graph");
        assert_eq!(leaf.neighbor_ids, vec!["DA-04"]);

        assert!(graph.incident("missing").is_none());
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let mut left = NeighborhoodGraph::new();
        left.add_node(node("a", NodeKind::Defensive));
        left.add_node(node("b", NodeKind::Artifact));

        let mut right = NeighborhoodGraph::new();
        right.add_node(node("b", NodeKind::Artifact));
        right.add_node(node("a", NodeKind::Defensive));

        assert_eq!(left, right);
    }
}
