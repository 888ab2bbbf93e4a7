//! RISC-V architectural state core.
//!
//! This crate implements the state a simulated RISC-V program observes and mutates:
//! 1. **Memory:** Segmented, lazily allocated 32-bit memory with self-modifying code,
//!    a heap allocator and range-scoped observers.
//! 2. **Registers:** General-purpose, floating-point (NaN-boxed) and control/status
//!    register files built from one shared register cell.
//! 3. **Atomics:** Per-hart reservation sets for load-reserved / store-conditional.
//! 4. **Layouts:** Built-in and JSON-loaded memory configurations.
//! 5. **Undo:** Restore records pushed to an optional backstepper.
//!
//! Instruction decoding and execution live outside this crate and drive it through
//! [`sim::Machine`].

/// Common types and constants (access types, errors, notices, trap causes).
pub mod common;
/// Configuration (defaults, JSON loading, configuration errors).
pub mod config;
/// Core state (register files, reservations, undo records).
pub mod core;
/// Instruction collaborators (statements, decoder seam, symbol lookup).
pub mod isa;
/// Simulation context.
pub mod sim;
/// System-on-chip storage (memory and layouts).
pub mod soc;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Machine context bundling memory, registers and reservations.
pub use crate::sim::Machine;
/// Segmented main memory.
pub use crate::soc::Memory;
