//! Address and Resource Error definitions.
//!
//! This module defines the recoverable errors raised by the architectural state. It provides:
//! 1. **Address Errors:** Misalignment and access faults, split by load/store direction.
//! 2. **Heap Errors:** Failures of the bump allocator behind `sbrk`-style requests.
//! 3. **Observer Errors:** Rejected observer range registrations.
//! 4. **Reservation Errors:** Misaligned reservations and unknown harts.
//!
//! Every address error maps onto a RISC-V exception cause through [`AddressError::cause`],
//! which is what the execution loop uses to raise the matching trap.

use thiserror::Error;

use super::constants::{
    LOAD_ACCESS_FAULT, LOAD_ADDRESS_MISALIGNED, STORE_ACCESS_FAULT, STORE_ADDRESS_MISALIGNED,
};

/// Error raised by a memory access or reservation on an unusable address.
///
/// Each variant carries the offending address. Load and store flavours are kept
/// apart because they map to different trap causes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AddressError {
    /// A load (or reservation) used an address not aligned to its access width.
    #[error("load address not aligned to access boundary: {0:#010x}")]
    LoadMisaligned(u32),

    /// A store (or store-conditional) used an address not aligned to its access width.
    #[error("store address not aligned to access boundary: {0:#010x}")]
    StoreMisaligned(u32),

    /// A load touched an address outside every segment.
    #[error("load address out of range: {0:#010x}")]
    LoadOutOfRange(u32),

    /// A store touched an address outside every segment.
    #[error("store address out of range: {0:#010x}")]
    StoreOutOfRange(u32),

    /// A direct data read from the text segment while self-modifying code is disabled.
    #[error("cannot read directly from text segment: {0:#010x}")]
    TextReadForbidden(u32),

    /// A direct data write to the text segment while self-modifying code is disabled.
    #[error("cannot write directly to text segment: {0:#010x}")]
    TextWriteForbidden(u32),
}

impl AddressError {
    /// Returns the faulting address.
    pub const fn address(&self) -> u32 {
        match *self {
            Self::LoadMisaligned(a)
            | Self::StoreMisaligned(a)
            | Self::LoadOutOfRange(a)
            | Self::StoreOutOfRange(a)
            | Self::TextReadForbidden(a)
            | Self::TextWriteForbidden(a) => a,
        }
    }

    /// Returns the RISC-V exception cause code for this error.
    ///
    /// # Returns
    ///
    /// One of `LOAD_ADDRESS_MISALIGNED` (4), `LOAD_ACCESS_FAULT` (5),
    /// `STORE_ADDRESS_MISALIGNED` (6) or `STORE_ACCESS_FAULT` (7).
    pub const fn cause(&self) -> u32 {
        match self {
            Self::LoadMisaligned(_) => LOAD_ADDRESS_MISALIGNED,
            Self::LoadOutOfRange(_) | Self::TextReadForbidden(_) => LOAD_ACCESS_FAULT,
            Self::StoreMisaligned(_) => STORE_ADDRESS_MISALIGNED,
            Self::StoreOutOfRange(_) | Self::TextWriteForbidden(_) => STORE_ACCESS_FAULT,
        }
    }

    /// Returns `true` for the two misalignment variants.
    pub const fn is_misaligned(&self) -> bool {
        matches!(self, Self::LoadMisaligned(_) | Self::StoreMisaligned(_))
    }
}

/// Error raised by the heap bump allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HeapError {
    /// The requested size was negative.
    #[error("request ({0}) is negative heap amount")]
    NegativeSize(i32),

    /// The request would move the heap cursor past the data segment limit.
    #[error("request ({0}) exceeds available heap storage")]
    Exhausted(i32),
}

/// Error raised when an observer range cannot be registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ObserverRangeError {
    /// The end address lies below the start address.
    #[error("observer range end {end:#010x} is below start {start:#010x}")]
    Inverted {
        /// First observed address.
        start: u32,
        /// Last observed word address.
        end: u32,
    },

    /// The range crosses the 0x80000000 boundary and must be split by the caller.
    #[error("observer range {start:#010x}..={end:#010x} crosses the 0x80000000 boundary")]
    StraddlesSignBoundary {
        /// First observed address.
        start: u32,
        /// Last observed word address.
        end: u32,
    },
}

/// Error raised by the reservation tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ReservationError {
    /// The reservation address is not aligned to its width.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The hart index is outside the table.
    #[error("no reservation table for hart {hart} ({harts} harts configured)")]
    NoSuchHart {
        /// Requested hart.
        hart: usize,
        /// Number of configured harts.
        harts: usize,
    },
}
