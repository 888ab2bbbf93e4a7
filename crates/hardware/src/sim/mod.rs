//! Simulation context.
//!
//! Provides the [`Machine`] that bundles memory, registers and reservations and is passed
//! explicitly to the execution loop and debugger.

/// Machine context.
pub mod machine;

pub use machine::Machine;
