//! Defensive taxonomy records.
//!
//! # Responsibility
//! - Define categories (tactics), defensive techniques, digital artifacts and
//!   offensive cross-mappings.
//! - Define the dataset JSON wire shape via serde.
//!
//! # Invariants
//! - `Technique::category_id` should name an existing `Category`.
//! - `Technique::artifact_names` joins to `Artifact::name`, not to its id.
//! - "Set" fields keep declaration order; consumers deduplicate.

use serde::{Deserialize, Serialize};

/// Category (tactic) identifier, e.g. `harden`.
pub type CategoryId = String;
/// Defensive technique identifier, e.g. `D3-CH`.
pub type TechniqueId = String;
/// Digital artifact identifier, e.g. `DA-04`.
pub type ArtifactId = String;
/// Offensive technique identifier, e.g. `T1003`.
pub type OffensiveId = String;

/// Matrix column: one defensive tactic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// Defensive technique shown as one matrix cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub id: TechniqueId,
    pub name: String,
    /// Owning category. Unknown ids drop the technique from the matrix.
    pub category_id: CategoryId,
    pub description: String,
    /// Artifact names in declaration order. Unresolved names are ignored.
    #[serde(default)]
    pub artifact_names: Vec<String>,
}

impl Technique {
    /// Returns whether `id` or `name` contains `needle_lower`.
    ///
    /// `needle_lower` must already be lowercased.
    pub fn matches_search(&self, needle_lower: &str) -> bool {
        self.id.to_lowercase().contains(needle_lower)
            || self.name.to_lowercase().contains(needle_lower)
    }

    /// Returns whether this technique references an artifact with `name`.
    pub fn references_artifact(&self, name: &str) -> bool {
        self.artifact_names.iter().any(|value| value == name)
    }
}

/// Digital artifact bridging offensive and defensive techniques.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    /// Join key for `Technique::artifact_names`; unique per store.
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub related_offensive_ids: Vec<OffensiveId>,
    #[serde(default)]
    pub related_defensive_ids: Vec<TechniqueId>,
}

/// Offensive technique mapped onto defensive techniques and artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossMapping {
    pub offensive_id: OffensiveId,
    pub offensive_name: String,
    #[serde(default)]
    pub defensive_ids: Vec<TechniqueId>,
    #[serde(default)]
    pub artifact_ids: Vec<ArtifactId>,
}

impl CrossMapping {
    /// Returns whether this mapping lists `technique_id` as a countermeasure.
    pub fn covers_technique(&self, technique_id: &str) -> bool {
        self.defensive_ids.iter().any(|id| id == technique_id)
    }

    /// Returns whether this mapping references `artifact_id`.
    pub fn references_artifact(&self, artifact_id: &str) -> bool {
        self.artifact_ids.iter().any(|id| id == artifact_id)
    }
}

/// Raw dataset as loaded from static configuration.
///
/// Not validated; see [`crate::store::TaxonomyStore::try_new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDataset {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub techniques: Vec<Technique>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub cross_mappings: Vec<CrossMapping>,
}
