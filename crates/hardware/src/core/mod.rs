//! Core architectural state.
//!
//! This module contains the per-hart state of the simulated processor: the register
//! files, the atomic reservation sets and the undo records that let a debugger step
//! backwards.

/// Architectural registers (GPRs, FPRs, CSRs).
pub mod arch;

/// Undo records and the backstepper seam.
pub mod backstep;

/// Functional units (reservation sets of the LSU).
pub mod units;
