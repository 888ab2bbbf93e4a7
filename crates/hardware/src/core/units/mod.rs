//! Functional units.
//!
//! Only the load/store unit carries architectural state: the reservation sets used by
//! the atomic extension.

/// Load/Store Unit reservation state.
pub mod lsu;
