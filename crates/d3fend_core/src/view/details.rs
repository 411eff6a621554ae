//! Details-panel projections.
//!
//! # Responsibility
//! - Build the details payload for the selected technique.
//! - Build per-node details for bridge-graph clicks.
//! - Name the placeholder states shown instead of empty panels.
//!
//! # Invariants
//! - Cross-mappings appear in `DetailsView` only when the toggle is on.
//! - Cross-mappings are matched by defensive technique id, independent of
//!   the expanded neighborhood.

use crate::model::graph::NodeKind;
use crate::model::taxonomy::{Artifact, CrossMapping, Technique};
use crate::store::TaxonomyStore;

/// Empty states with dedicated messaging. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// No technique is selected.
    NothingSelected,
    /// The previous selection was removed by a filter change.
    SelectionFilteredOut,
    /// Selected technique lists no artifact names.
    NoArtifacts,
    /// Cross-mappings are shown but none reference the selection.
    NoCrossMappings,
    /// Current filter matches no technique.
    EmptyMatrix,
}

impl Placeholder {
    pub fn message(self) -> &'static str {
        match self {
            Self::NothingSelected => "Select a technique from the matrix to view details.",
            Self::SelectionFilteredOut => {
                "Selected technique is no longer visible with current filters."
            }
            Self::NoArtifacts => "No digital artifacts defined.",
            Self::NoCrossMappings => "No ATT&CK mappings found for this technique.",
            Self::EmptyMatrix => "No techniques match the current filters.",
        }
    }
}

/// Details payload for the selected technique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsView {
    pub technique: Technique,
    /// Category display name, or the raw id when the category is unknown.
    pub category_name: String,
    /// Artifact names as declared, including unresolved ones.
    pub artifact_names: Vec<String>,
    /// Artifacts that the names resolve to.
    pub related_artifacts: Vec<Artifact>,
    /// `Some` only while cross-mappings are toggled on.
    pub cross_mappings: Option<Vec<CrossMapping>>,
}

impl DetailsView {
    /// Placeholders applicable to sections of this payload.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut out = Vec::new();
        if self.artifact_names.is_empty() {
            out.push(Placeholder::NoArtifacts);
        }
        if matches!(&self.cross_mappings, Some(mappings) if mappings.is_empty()) {
            out.push(Placeholder::NoCrossMappings);
        }
        out
    }
}

/// Builds the details payload for `technique`.
pub fn build_details(
    store: &TaxonomyStore,
    technique: &Technique,
    show_cross_mappings: bool,
) -> DetailsView {
    let cross_mappings = show_cross_mappings.then(|| {
        store
            .mappings_for_technique(&technique.id)
            .into_iter()
            .cloned()
            .collect()
    });

    DetailsView {
        technique: technique.clone(),
        category_name: store.category_name_or_id(&technique.category_id).to_string(),
        artifact_names: technique.artifact_names.clone(),
        related_artifacts: store
            .resolve_artifacts(technique)
            .into_iter()
            .cloned()
            .collect(),
        cross_mappings,
    }
}

/// Details for one clicked bridge-graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDetails {
    Offensive {
        mapping: CrossMapping,
        /// Resolvable defensive techniques listed by the mapping.
        countermeasures: Vec<Technique>,
    },
    Defensive {
        technique: Technique,
        /// Mappings that list this technique as a countermeasure.
        addressed: Vec<CrossMapping>,
    },
    Artifact {
        artifact: Artifact,
        /// Mappings whose artifact ids include this artifact.
        offensive: Vec<CrossMapping>,
        /// Techniques whose artifact names include this artifact's name.
        defensive: Vec<Technique>,
    },
}

/// Resolves details for node `node_id` of `kind`.
///
/// Returns `None` when the id does not resolve in the store.
pub fn node_details(store: &TaxonomyStore, node_id: &str, kind: NodeKind) -> Option<NodeDetails> {
    match kind {
        NodeKind::Offensive => {
            let mapping = store.cross_mapping(node_id)?;
            let countermeasures = mapping
                .defensive_ids
                .iter()
                .filter_map(|id| store.technique(id))
                .cloned()
                .collect();
            Some(NodeDetails::Offensive {
                mapping: mapping.clone(),
                countermeasures,
            })
        }
        NodeKind::Defensive => {
            let technique = store.technique(node_id)?;
            Some(NodeDetails::Defensive {
                technique: technique.clone(),
                addressed: store
                    .mappings_for_technique(node_id)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
        }
        NodeKind::Artifact => {
            let artifact = store.artifact(node_id)?;
            let offensive = store
                .cross_mappings()
                .iter()
                .filter(|mapping| mapping.references_artifact(&artifact.id))
                .cloned()
                .collect();
            let defensive = store
                .techniques()
                .iter()
                .filter(|technique| technique.references_artifact(&artifact.name))
                .cloned()
                .collect();
            Some(NodeDetails::Artifact {
                artifact: artifact.clone(),
                offensive,
                defensive,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_details, node_details, NodeDetails, Placeholder};
    use crate::model::graph::NodeKind;
    use crate::store::TaxonomyStore;

    #[test]
    fn cross_mappings_only_present_when_toggled() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let technique = store.technique("D3-CH").expect("D3-CH");

        let hidden = build_details(&store, technique, false);
        assert_eq!(hidden.cross_mappings, None);
        assert_eq!(hidden.category_name, "Harden");

        let shown = build_details(&store, technique, true);
        let ids = shown
            .cross_mappings
            .expect("toggled on")
            .into_iter()
            .map(|mapping| mapping.offensive_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["T1003", "T1078"]);
    }

    #[test]
    fn reports_no_cross_mappings_placeholder() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let technique = store.technique("D3-AM").expect("D3-AM");
        let details = build_details(&store, technique, true);
        assert_eq!(details.placeholders(), vec![Placeholder::NoCrossMappings]);
        assert!(details.related_artifacts.is_empty());
        assert_eq!(details.artifact_names.len(), 2);
    }

    #[test]
    fn reports_no_artifacts_placeholder() {
        let store = TaxonomyStore::from_json_str(
            r#"{
                "categories": [{"id": "harden", "name": "Harden", "description": ""}],
                "techniques": [{
                    "id": "D3-BARE",
                    "name": "Bare Technique",
                    "category_id": "harden",
                    "description": "No artifacts declared."
                }]
            }"#,
        )
        .expect("inline dataset");
        let technique = store.technique("D3-BARE").expect("D3-BARE");

        let details = build_details(&store, technique, false);
        assert_eq!(details.placeholders(), vec![Placeholder::NoArtifacts]);
        assert_eq!(
            details.placeholders()[0].message(),
            "No digital artifacts defined."
        );

        let shown = build_details(&store, technique, true);
        assert_eq!(
            shown.placeholders(),
            vec![Placeholder::NoArtifacts, Placeholder::NoCrossMappings]
        );
    }

    #[test]
    fn offensive_node_lists_resolvable_countermeasures() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let details = node_details(&store, "T1055", NodeKind::Offensive).expect("T1055");
        let NodeDetails::Offensive { countermeasures, .. } = details else {
            panic!("expected offensive details");
        };
        let ids = countermeasures.iter().map(|t| t.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["D3-PA", "D3-KBPI", "D3-PE"]);
    }

    #[test]
    fn unknown_node_has_no_details() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        assert!(node_details(&store, "T9999", NodeKind::Offensive).is_none());
        assert!(node_details(&store, "DA-04", NodeKind::Defensive).is_none());
    }
}
