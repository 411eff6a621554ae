//! Taxonomy domain model and derived graph shapes.
//!
//! # Responsibility
//! - Define the immutable records loaded from the taxonomy dataset.
//! - Define node/edge shapes handed to bridge-graph renderers.
//!
//! # Invariants
//! - Records are never mutated after the store is built.
//! - Cross-record references are plain ids (or names for artifacts) and may
//!   dangle; derived views omit what does not resolve.

pub mod graph;
pub mod taxonomy;
