//! Taxonomy store implementation.

use crate::model::taxonomy::{
    Artifact, Category, CrossMapping, TaxonomyDataset, Technique,
};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Bundled sample dataset (6 tactics, 18 techniques, 5 artifacts, 5 mappings).
pub const BUILTIN_DATASET_JSON: &str = include_str!("../data/d3fend_sample.json");

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid id regex"));

pub type StoreResult<T> = Result<T, StoreError>;

/// Load-time dataset errors.
#[derive(Debug)]
pub enum StoreError {
    /// Id is blank or contains characters outside `[A-Za-z0-9._-]`.
    InvalidId {
        entity: &'static str,
        id: String,
    },
    /// Two records of the same entity share one id.
    DuplicateId {
        entity: &'static str,
        id: String,
    },
    /// Two artifacts share one name, making the name join ambiguous.
    DuplicateArtifactName(String),
    /// Dataset JSON cannot be decoded.
    Parse(serde_json::Error),
    /// Dataset file cannot be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId { entity, id } => write!(f, "invalid {entity} id: `{id}`"),
            Self::DuplicateId { entity, id } => write!(f, "duplicate {entity} id: {id}"),
            Self::DuplicateArtifactName(name) => {
                write!(f, "duplicate artifact name: `{name}`")
            }
            Self::Parse(err) => write!(f, "invalid dataset json: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to read dataset `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Validated, immutable taxonomy dataset with lookup indexes.
///
/// Shared by reference (usually behind `Arc`) between view controllers.
#[derive(Debug, Clone)]
pub struct TaxonomyStore {
    dataset: TaxonomyDataset,
    category_index: HashMap<String, usize>,
    technique_index: HashMap<String, usize>,
    artifact_index: HashMap<String, usize>,
    artifact_name_index: HashMap<String, usize>,
    mapping_index: HashMap<String, usize>,
}

impl TaxonomyStore {
    /// Validates `dataset` and builds lookup indexes.
    ///
    /// # Errors
    /// - `InvalidId` for blank or malformed ids.
    /// - `DuplicateId` when an id repeats within one entity list.
    /// - `DuplicateArtifactName` when two artifacts share a name.
    pub fn try_new(dataset: TaxonomyDataset) -> StoreResult<Self> {
        let category_index = index_ids("category", dataset.categories.iter().map(|c| &c.id))?;
        let technique_index =
            index_ids("technique", dataset.techniques.iter().map(|t| &t.id))?;
        let artifact_index = index_ids("artifact", dataset.artifacts.iter().map(|a| &a.id))?;
        let mapping_index = index_ids(
            "cross_mapping",
            dataset.cross_mappings.iter().map(|m| &m.offensive_id),
        )?;

        let mut artifact_name_index = HashMap::with_capacity(dataset.artifacts.len());
        for (position, artifact) in dataset.artifacts.iter().enumerate() {
            if artifact_name_index
                .insert(artifact.name.clone(), position)
                .is_some()
            {
                return Err(StoreError::DuplicateArtifactName(artifact.name.clone()));
            }
        }

        let orphaned = dataset
            .techniques
            .iter()
            .filter(|technique| !category_index.contains_key(technique.category_id.as_str()))
            .count();
        if orphaned > 0 {
            warn!(
                "event=dataset_load module=store status=degraded orphaned_techniques={}",
                orphaned
            );
        }

        info!(
            "event=dataset_load module=store status=ok categories={} techniques={} artifacts={} cross_mappings={}",
            dataset.categories.len(),
            dataset.techniques.len(),
            dataset.artifacts.len(),
            dataset.cross_mappings.len()
        );

        Ok(Self {
            dataset,
            category_index,
            technique_index,
            artifact_index,
            artifact_name_index,
            mapping_index,
        })
    }

    /// Builds the store from the bundled sample dataset.
    pub fn builtin() -> StoreResult<Self> {
        Self::from_json_str(BUILTIN_DATASET_JSON)
    }

    /// Decodes and validates a dataset JSON document.
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let dataset: TaxonomyDataset = serde_json::from_str(json)?;
        Self::try_new(dataset)
    }

    /// Reads, decodes and validates a dataset JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn dataset(&self) -> &TaxonomyDataset {
        &self.dataset
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> &[Category] {
        &self.dataset.categories
    }

    /// Techniques in declaration order.
    pub fn techniques(&self) -> &[Technique] {
        &self.dataset.techniques
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.dataset.artifacts
    }

    pub fn cross_mappings(&self) -> &[CrossMapping] {
        &self.dataset.cross_mappings
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.category_index
            .get(id)
            .map(|&position| &self.dataset.categories[position])
    }

    pub fn technique(&self, id: &str) -> Option<&Technique> {
        self.technique_index
            .get(id)
            .map(|&position| &self.dataset.techniques[position])
    }

    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.artifact_index
            .get(id)
            .map(|&position| &self.dataset.artifacts[position])
    }

    /// Resolves the name join used by `Technique::artifact_names`.
    pub fn artifact_by_name(&self, name: &str) -> Option<&Artifact> {
        self.artifact_name_index
            .get(name)
            .map(|&position| &self.dataset.artifacts[position])
    }

    /// Looks up the cross-mapping for one offensive technique id.
    pub fn cross_mapping(&self, offensive_id: &str) -> Option<&CrossMapping> {
        self.mapping_index
            .get(offensive_id)
            .map(|&position| &self.dataset.cross_mappings[position])
    }

    /// Returns the category display name, or the raw id when unknown.
    pub fn category_name_or_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.category(id)
            .map_or(id, |category| category.name.as_str())
    }

    /// Resolves a technique's artifact names, skipping unresolved ones.
    ///
    /// Repeated names yield the artifact once.
    pub fn resolve_artifacts(&self, technique: &Technique) -> Vec<&Artifact> {
        let mut resolved: Vec<&Artifact> = Vec::with_capacity(technique.artifact_names.len());
        for name in &technique.artifact_names {
            if let Some(artifact) = self.artifact_by_name(name) {
                if !resolved.iter().any(|seen| seen.id == artifact.id) {
                    resolved.push(artifact);
                }
            }
        }
        resolved
    }

    /// Cross-mappings that list `technique_id` as a countermeasure.
    pub fn mappings_for_technique(&self, technique_id: &str) -> Vec<&CrossMapping> {
        self.dataset
            .cross_mappings
            .iter()
            .filter(|mapping| mapping.covers_technique(technique_id))
            .collect()
    }
}

fn index_ids<'a>(
    entity: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> StoreResult<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (position, id) in ids.enumerate() {
        if !ID_RE.is_match(id) {
            return Err(StoreError::InvalidId {
                entity,
                id: id.clone(),
            });
        }
        if index.insert(id.clone(), position).is_some() {
            return Err(StoreError::DuplicateId {
                entity,
                id: id.clone(),
            });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::{StoreError, TaxonomyStore};
    use crate::model::taxonomy::{Artifact, Category, TaxonomyDataset, Technique};

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
        }
    }

    fn artifact(id: &str, name: &str) -> Artifact {
        Artifact {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            related_offensive_ids: Vec::new(),
            related_defensive_ids: Vec::new(),
        }
    }

    #[test]
    fn builtin_dataset_loads() {
        let store = TaxonomyStore::builtin().expect("builtin dataset must validate");
        assert_eq!(store.categories().len(), 6);
        assert_eq!(store.techniques().len(), 18);
        assert_eq!(store.artifacts().len(), 5);
        assert_eq!(store.cross_mappings().len(), 5);
    }

    #[test]
    fn rejects_duplicate_category_id() {
        let dataset = TaxonomyDataset {
            categories: vec![category("harden"), category("harden")],
            ..TaxonomyDataset::default()
        };
        let err = TaxonomyStore::try_new(dataset).expect_err("duplicate id must fail");
        assert!(matches!(
            err,
            StoreError::DuplicateId { entity: "category", ref id } if id == "harden"
        ));
    }

    #[test]
    fn rejects_blank_and_malformed_ids() {
        let dataset = TaxonomyDataset {
            categories: vec![category("  ")],
            ..TaxonomyDataset::default()
        };
        let err = TaxonomyStore::try_new(dataset).expect_err("blank id must fail");
        assert!(matches!(err, StoreError::InvalidId { .. }));

        let dataset = TaxonomyDataset {
            artifacts: vec![artifact("DA 04", "Credential")],
            ..TaxonomyDataset::default()
        };
        let err = TaxonomyStore::try_new(dataset).expect_err("space in id must fail");
        assert!(matches!(err, StoreError::InvalidId { entity: "artifact", .. }));
    }

    #[test]
    fn rejects_duplicate_artifact_name() {
        let dataset = TaxonomyDataset {
            artifacts: vec![artifact("DA-01", "File"), artifact("DA-02", "File")],
            ..TaxonomyDataset::default()
        };
        let err = TaxonomyStore::try_new(dataset).expect_err("duplicate name must fail");
        assert!(matches!(err, StoreError::DuplicateArtifactName(ref name) if name == "File"));
    }

    #[test]
    fn keeps_techniques_with_unknown_category() {
        let dataset = TaxonomyDataset {
            categories: vec![category("harden")],
            techniques: vec![Technique {
                id: "D3-X".to_string(),
                name: "Orphan".to_string(),
                category_id: "missing".to_string(),
                description: String::new(),
                artifact_names: Vec::new(),
            }],
            ..TaxonomyDataset::default()
        };
        let store = TaxonomyStore::try_new(dataset).expect("dangling category is permitted");
        assert!(store.technique("D3-X").is_some());
        assert_eq!(store.category_name_or_id("missing"), "missing");
        assert_eq!(store.category_name_or_id("harden"), "HARDEN");
    }

    #[test]
    fn resolve_artifacts_skips_unknown_names() {
        let store = TaxonomyStore::builtin().expect("builtin dataset");
        let technique = store.technique("D3-CH").expect("D3-CH exists");
        let resolved = store
            .resolve_artifacts(technique)
            .into_iter()
            .map(|artifact| artifact.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(resolved, vec!["DA-04", "DA-05"]);
    }

    #[test]
    fn reports_parse_errors() {
        let err = TaxonomyStore::from_json_str("{ not json").expect_err("bad json must fail");
        assert!(matches!(err, StoreError::Parse(_)));
        assert!(err.to_string().contains("invalid dataset json"));
    }
}
