//! Export of the current matrix view.

pub mod csv;
