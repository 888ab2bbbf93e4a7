//! Load/Store Unit (LSU) support state.
//!
//! The simulated memory itself lives in `soc::memory`. This module holds the state the
//! LSU keeps next to it:
//! - [`reservation`]: Reservation sets backing `lr` / `sc`.

/// Load-reserved / store-conditional reservation sets.
pub mod reservation;

pub use reservation::{
    RESERVATION_CAPACITY, Reservation, ReservationObserver, ReservationTable, ReservationTables,
    ReservationWidth,
};
