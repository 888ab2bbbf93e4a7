//! # Architectural Components
//!
//! This module covers the register building blocks: single registers with their masked,
//! read-only and linked behaviours, and the integer, floating-point and CSR files built
//! from them.

/// Unit tests for single registers: masks, links, reset values and observers.
pub mod register;


/// Unit tests for floating-point registers and NaN-boxing.
///
/// Single-precision values must be stored with the upper 32 bits set and read back as the
/// canonical NaN when that box is broken.
pub mod fpr_nan_boxing;
