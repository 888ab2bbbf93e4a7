//! RISC-V architectural register state.
//!
//! This module contains the register model of the simulated hart. It includes the
//! following modules:
//! 1. **Registers:** The shared storage cell with plain, masked, read-only and linked variants.
//! 2. **Blocks:** Numbered, named collections of registers.
//! 3. **GPRs:** General-purpose register file and program counter.
//! 4. **FPRs:** NaN-boxing floating-point register file.
//! 5. **CSRs:** Control and status register file.

/// Register storage cell.
pub mod register;

/// Register blocks.
pub mod block;

/// Control and Status Register (CSR) file.
pub mod csr;

/// Floating-Point Register file.
pub mod fpr;

/// General-Purpose Register file.
pub mod gpr;

pub use block::RegisterBlock;
pub use csr::ControlAndStatusRegisterFile;
pub use fpr::FloatingPointRegisterFile;
pub use gpr::RegisterFile;
pub use register::{Register, RegisterKind};
