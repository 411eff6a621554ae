//! Selection/view-state controller.
//!
//! # Responsibility
//! - Own the only mutable view state: filter, selection, cross-mapping toggle.
//! - Recompute derived views and notify subscribers synchronously.
//! - Drive an optional bridge-graph renderer.
//!
//! # Invariants
//! - Every operation fully updates state and notifies before returning.
//! - The taxonomy store is shared read-only and never mutated.

mod view_controller;

pub use view_controller::{
    GraphRenderer, SubscriptionId, ViewConfig, ViewController, ViewEvent,
};
