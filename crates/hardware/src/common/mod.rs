//! Common utilities and types used throughout the architectural state core.
//!
//! This module provides the building blocks shared by memory, registers and reservations:
//! 1. **Constants:** Access widths, block-table geometry, trap causes, NaN-boxing patterns.
//! 2. **Access Types:** Read/write classification of observed accesses.
//! 3. **Error Handling:** Address, heap, observer-range and reservation errors.
//! 4. **Notices:** Memory and register access notices and the observer traits.

/// Common constants used throughout the core.
pub mod constants;

/// Access type definitions.
pub mod data;

/// Error types.
pub mod error;

/// Access notices and observer traits.
pub mod notice;

pub use data::AccessType;
pub use error::{AddressError, HeapError, ObserverRangeError, ReservationError};
pub use notice::{
    AccessNotice, MemoryAccessNotice, MemoryObserver, ObserverId, RegisterAccessNotice,
    RegisterObserver,
};
