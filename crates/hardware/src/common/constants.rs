//! Global Architectural Constants.
//!
//! This module defines constants shared by the memory model, the register files
//! and the reservation tables. It includes:
//! 1. **Access Widths:** Byte lengths of word, half-word and double-word accesses.
//! 2. **Block Tables:** Block sizes and table lengths used by the lazily allocated memory.
//! 3. **Trap Causes:** Exception cause codes reported by address errors.
//! 4. **Floating Point:** NaN-boxing patterns for single-precision values.

/// Size of a word access in bytes.
pub const WORD_LENGTH_BYTES: u32 = 4;

/// Size of a half-word access in bytes.
pub const HALF_LENGTH_BYTES: u32 = 2;

/// Size of a byte access in bytes.
pub const BYTE_LENGTH_BYTES: u32 = 1;

/// Size of a double-word access in bytes.
pub const DOUBLE_WORD_LENGTH_BYTES: u32 = 8;

/// Length of one instruction in bytes; `increment_pc` advances by this amount.
pub const INSTRUCTION_LENGTH: u32 = 4;

/// Number of words in one lazily allocated memory block (4 KiB).
pub const BLOCK_LENGTH_WORDS: usize = 1024;

/// Number of bytes in one lazily allocated memory block.
pub const BLOCK_LENGTH_BYTES: u32 = (BLOCK_LENGTH_WORDS as u32) * WORD_LENGTH_BYTES;

/// Maximum number of blocks in the text, data and stack tables.
pub const BLOCK_TABLE_LENGTH: usize = 1024;

/// Maximum number of blocks in the memory-mapped I/O table.
pub const MMIO_TABLE_LENGTH: usize = 16;

/// Trap cause for a misaligned load.
pub const LOAD_ADDRESS_MISALIGNED: u32 = 4;

/// Trap cause for a load access fault.
pub const LOAD_ACCESS_FAULT: u32 = 5;

/// Trap cause for a misaligned store.
pub const STORE_ADDRESS_MISALIGNED: u32 = 6;

/// Trap cause for a store access fault.
pub const STORE_ACCESS_FAULT: u32 = 7;

/// Upper-half pattern of a NaN-boxed single-precision value.
pub const NAN_BOX_MASK: u64 = 0xFFFF_FFFF_0000_0000;

/// Canonical quiet NaN for single precision.
pub const CANONICAL_NAN_F32: u32 = 0x7FC0_0000;

/// Lowest address of the upper (kernel) half of the 32-bit address space.
pub const SIGN_BOUNDARY: u32 = 0x8000_0000;
