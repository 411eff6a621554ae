//! Immutable taxonomy store and dataset loading.
//!
//! # Responsibility
//! - Validate a raw dataset once, at load time.
//! - Answer id/name lookups for every derivation in `view`.
//!
//! # Invariants
//! - Duplicate ids and duplicate artifact names are rejected at load.
//! - Dangling references are kept; derivations omit them.

mod taxonomy_store;

pub use taxonomy_store::{StoreError, StoreResult, TaxonomyStore, BUILTIN_DATASET_JSON};
