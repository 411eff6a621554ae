//! Neighborhood expansion for the bridge graph.
//!
//! # Responsibility
//! - Build the induced subgraph around one selected defensive technique.
//! - Build the startup overview graph from a small fixed sample.
//!
//! # Invariants
//! - Unresolved artifact names and unknown offensive ids are skipped.
//! - Nodes are unique by id; edges are unique by `(source, target, kind)`.
//! - Expansion is deterministic for the same technique and store.

use crate::model::graph::{EdgeKind, GraphEdge, GraphNode, NeighborhoodGraph, NodeKind};
use crate::model::taxonomy::{Artifact, CrossMapping, Technique};
use crate::store::TaxonomyStore;
use log::debug;

/// Mappings and techniques sampled into the overview graph.
pub const OVERVIEW_SAMPLE_SIZE: usize = 3;

/// Expands the neighborhood of `technique`.
///
/// Seed node, then one artifact node + defensive edge per resolvable
/// artifact name, then one offensive node + offensive edge per related
/// offensive id that has a cross-mapping.
pub fn expand(technique: &Technique, store: &TaxonomyStore) -> NeighborhoodGraph {
    let mut graph = NeighborhoodGraph::new();
    graph.add_node(defensive_node(technique));

    for name in &technique.artifact_names {
        let Some(artifact) = store.artifact_by_name(name) else {
            continue;
        };
        graph.add_node(artifact_node(artifact));
        graph.add_edge(GraphEdge::new(
            technique.id.as_str(),
            artifact.id.as_str(),
            EdgeKind::DefensiveToArtifact,
        ));

        for offensive_id in &artifact.related_offensive_ids {
            let Some(mapping) = store.cross_mapping(offensive_id) else {
                continue;
            };
            graph.add_node(offensive_node(mapping));
            graph.add_edge(GraphEdge::new(
                mapping.offensive_id.as_str(),
                artifact.id.as_str(),
                EdgeKind::OffensiveToArtifact,
            ));
        }
    }

    debug!(
        "event=neighborhood_expand module=view technique={} nodes={} edges={}",
        technique.id,
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

/// Builds the overview shown before any selection.
///
/// Contains every artifact, the first `sample_size` cross-mappings linked to
/// their artifacts, and the first `sample_size` techniques linked to theirs.
pub fn expand_overview(store: &TaxonomyStore, sample_size: usize) -> NeighborhoodGraph {
    let mut graph = NeighborhoodGraph::new();

    for artifact in store.artifacts() {
        graph.add_node(artifact_node(artifact));
    }

    for mapping in store.cross_mappings().iter().take(sample_size) {
        graph.add_node(offensive_node(mapping));
        for artifact_id in &mapping.artifact_ids {
            if store.artifact(artifact_id).is_none() {
                continue;
            }
            graph.add_edge(GraphEdge::new(
                mapping.offensive_id.as_str(),
                artifact_id.as_str(),
                EdgeKind::OffensiveToArtifact,
            ));
        }
    }

    for technique in store.techniques().iter().take(sample_size) {
        graph.add_node(defensive_node(technique));
        for artifact in store.resolve_artifacts(technique) {
            graph.add_edge(GraphEdge::new(
                technique.id.as_str(),
                artifact.id.as_str(),
                EdgeKind::DefensiveToArtifact,
            ));
        }
    }

    debug!(
        "event=overview_expand module=view sample_size={} nodes={} edges={}",
        sample_size,
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

pub fn defensive_node(technique: &Technique) -> GraphNode {
    GraphNode {
        id: technique.id.clone(),
        display_name: technique.name.clone(),
        kind: NodeKind::Defensive,
        description: technique.description.clone(),
    }
}

pub fn artifact_node(artifact: &Artifact) -> GraphNode {
    GraphNode {
        id: artifact.id.clone(),
        display_name: artifact.name.clone(),
        kind: NodeKind::Artifact,
        description: artifact.description.clone(),
    }
}

pub fn offensive_node(mapping: &CrossMapping) -> GraphNode {
    GraphNode {
        id: mapping.offensive_id.clone(),
        display_name: mapping.offensive_name.clone(),
        kind: NodeKind::Offensive,
        description: format!("ATT&CK Technique: {}", mapping.offensive_name),
    }
}

#[cfg(test)]
mod tests {
    use super::{expand, expand_overview, OVERVIEW_SAMPLE_SIZE};
    use crate::model::graph::{EdgeKind, NodeKind};
    use crate::store::TaxonomyStore;

    #[test]
    fn offensive_nodes_are_labeled_from_mapping() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let technique = store.technique("D3-CH").expect("D3-CH");
        let graph = expand(technique, &store);
        let node = graph.node("T1003").expect("T1003 node");
        assert_eq!(node.kind, NodeKind::Offensive);
        assert_eq!(node.display_name, "OS Credential Dumping");
        assert_eq!(node.description, "ATT&CK Technique: OS Credential Dumping");
    }

    #[test]
    fn shared_offensive_technique_gets_one_node_and_one_edge_per_artifact() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let technique = store.technique("D3-CH").expect("D3-CH");
        let graph = expand(technique, &store);

        // T1078 relates to "User Account" only; T1003 relates to "Credential".
        assert_eq!(
            graph.nodes().iter().filter(|n| n.id == "T1078").count(),
            1
        );
        assert!(graph.contains_edge("T1078", "DA-05", EdgeKind::OffensiveToArtifact));
        assert!(!graph.contains_edge("T1078", "DA-04", EdgeKind::OffensiveToArtifact));
    }

    #[test]
    fn overview_contains_every_artifact_and_samples() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let graph = expand_overview(&store, OVERVIEW_SAMPLE_SIZE);

        for artifact in store.artifacts() {
            assert!(graph.contains_node(&artifact.id));
        }
        for id in ["T1003", "T1055", "T1071", "D3-AM", "D3-NM", "D3-AI"] {
            assert!(graph.contains_node(id), "missing overview node {id}");
        }
        assert!(!graph.contains_node("T1078"));
        assert!(graph.contains_edge("T1003", "DA-04", EdgeKind::OffensiveToArtifact));
        assert!(graph.contains_edge("T1055", "DA-01", EdgeKind::OffensiveToArtifact));
        // Model techniques name no artifact present in the sample dataset.
        assert_eq!(
            graph
                .edges()
                .iter()
                .filter(|edge| edge.kind == EdgeKind::DefensiveToArtifact)
                .count(),
            0
        );
    }

    #[test]
    fn overview_with_zero_sample_only_has_artifacts() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let graph = expand_overview(&store, 0);
        assert_eq!(graph.node_count(), store.artifacts().len());
        assert_eq!(graph.edge_count(), 0);
    }
}
