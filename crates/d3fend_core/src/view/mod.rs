//! Pure view-model derivations over the taxonomy store.
//!
//! # Responsibility
//! - Filter, group and lay out techniques for the matrix.
//! - Expand technique neighborhoods for the bridge graph.
//! - Project details-panel payloads.
//!
//! # Invariants
//! - Functions here never mutate their inputs and have no side effects
//!   beyond debug logging.
//! - Unresolved references are omitted, never reported as errors.

pub mod details;
pub mod filter;
pub mod grouping;
pub mod neighborhood;
