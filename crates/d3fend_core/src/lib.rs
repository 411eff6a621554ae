//! Core view-model logic for the D3FEND matrix and digital-artifact bridge.
//! This crate is the single source of truth for taxonomy invariants; hosts
//! only render what it derives.

pub mod controller;
pub mod export;
pub mod logging;
pub mod model;
pub mod store;
pub mod view;

pub use controller::{GraphRenderer, SubscriptionId, ViewConfig, ViewController, ViewEvent};
pub use export::csv::{export_csv, EXPORT_FILE_NAME};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::graph::{EdgeKind, GraphEdge, GraphNode, NeighborhoodGraph, NodeHighlight, NodeKind};
pub use model::taxonomy::{
    Artifact, ArtifactId, Category, CategoryId, CrossMapping, OffensiveId, TaxonomyDataset,
    Technique, TechniqueId,
};
pub use store::{StoreError, StoreResult, TaxonomyStore};
pub use view::details::{build_details, node_details, DetailsView, NodeDetails, Placeholder};
pub use view::filter::{apply_filter, CategoryFilter, TechniqueFilter, CATEGORY_FILTER_ALL};
pub use view::grouping::{
    build_matrix, group_by_category, CategoryGroup, CategoryGroups, MatrixColumn, MatrixView,
};
pub use view::neighborhood::{expand, expand_overview, OVERVIEW_SAMPLE_SIZE};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
