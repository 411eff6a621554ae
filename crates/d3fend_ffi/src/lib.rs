//! Flutter-facing bindings for `d3fend_core`.

pub mod api;
