//! System-on-Chip (SoC) Components.
//!
//! This module organizes the storage side of the simulated system: the segmented main
//! memory, its layouts and the memory-mapped I/O window.

/// Segmented main memory and memory layouts.
pub mod memory;

pub use memory::Memory;
