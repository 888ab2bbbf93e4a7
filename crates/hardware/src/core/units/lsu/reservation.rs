//! Load-reserved / store-conditional reservation sets.
//!
//! Each hart owns a small FIFO of reserved addresses. This module implements:
//! 1. **Reserve:** `lr.w` / `lr.d` add an entry, evicting the oldest when full.
//! 2. **Check and Clear:** `sc.w` / `sc.d` succeed only if the hart still holds a matching
//!    entry; success clears that reservation on every hart.
//! 3. **Inspection:** A string table of all entries for debugger display, pushed to
//!    observers after every change.
//!
//! Ordinary stores do not clear reservations; only a successful store-conditional does.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::trace;

use crate::common::{AddressError, ObserverId, ReservationError};

/// Number of entries kept per hart.
pub const RESERVATION_CAPACITY: usize = 8;

/// Width of a reservation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReservationWidth {
    /// `lr.w` / `sc.w`, 4-byte aligned.
    Word,
    /// `lr.d` / `sc.d`, 8-byte aligned.
    DoubleWord,
}

impl ReservationWidth {
    /// Required alignment in bytes.
    pub const fn alignment(self) -> u32 {
        match self {
            Self::Word => 4,
            Self::DoubleWord => 8,
        }
    }

    /// Display character (`w` or `d`).
    pub const fn as_char(self) -> char {
        match self {
            Self::Word => 'w',
            Self::DoubleWord => 'd',
        }
    }
}

impl fmt::Display for ReservationWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One reserved address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reservation {
    /// Reserved address.
    pub address: u32,
    /// Reservation width.
    pub width: ReservationWidth,
}

impl Reservation {
    fn covers(self, address: u32, width: ReservationWidth) -> bool {
        (self.address == address && self.width == width)
            || (self.width == ReservationWidth::DoubleWord && self.address == address & !7)
    }
}

/// Reservation set of one hart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservationTable {
    entries: VecDeque<Reservation>,
}

impl ReservationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(RESERVATION_CAPACITY),
        }
    }

    /// Adds a reservation, evicting the oldest entry when the table is full.
    ///
    /// Re-reserving a held address moves it to the newest position.
    pub fn reserve_address(&mut self, address: u32, width: ReservationWidth) {
        let reservation = Reservation { address, width };
        self.entries.retain(|r| *r != reservation);
        if self.entries.len() == RESERVATION_CAPACITY {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(reservation);
    }

    /// Removes every entry matching `address`, and any double-word entry covering it.
    pub fn unreserve_address(&mut self, address: u32, width: ReservationWidth) {
        self.entries.retain(|r| !r.covers(address, width));
    }

    /// Returns `true` if a held entry matches or covers `address`.
    pub fn contains(&self, address: u32, width: ReservationWidth) -> bool {
        self.entries.iter().any(|r| r.covers(address, width))
    }

    /// Returns the entries, oldest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &Reservation> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// Receiver of reservation table snapshots.
pub trait ReservationObserver: Send + Sync {
    /// Called after the tables change with the output of
    /// [`ReservationTables::all_addresses_as_strings`].
    fn reservations_changed(&self, table: &[Vec<String>]);
}

impl<F> ReservationObserver for F
where
    F: Fn(&[Vec<String>]) + Send + Sync,
{
    fn reservations_changed(&self, table: &[Vec<String>]) {
        self(table);
    }
}

/// Reservation tables of every hart.
///
/// All tables sit behind one lock so a store-conditional checks and clears as a single step.
pub struct ReservationTables {
    tables: Mutex<Vec<ReservationTable>>,
    harts: usize,
    observers: RwLock<Vec<(ObserverId, Arc<dyn ReservationObserver>)>>,
}

impl ReservationTables {
    /// Creates one empty table per hart.
    pub fn new(harts: usize) -> Self {
        Self {
            tables: Mutex::new((0..harts).map(|_| ReservationTable::new()).collect()),
            harts,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Returns the number of harts.
    pub const fn harts(&self) -> usize {
        self.harts
    }

    fn tables(&self) -> MutexGuard<'_, Vec<ReservationTable>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    const fn check_hart(&self, hart: usize) -> Result<(), ReservationError> {
        if hart < self.harts {
            Ok(())
        } else {
            Err(ReservationError::NoSuchHart {
                hart,
                harts: self.harts,
            })
        }
    }

    /// Reserves `address` for `hart` (`lr.w` / `lr.d`).
    ///
    /// # Returns
    ///
    /// `AddressError::LoadMisaligned` if `address` is not aligned to `width`.
    pub fn reserve_address(
        &self,
        hart: usize,
        address: u32,
        width: ReservationWidth,
    ) -> Result<(), ReservationError> {
        if address % width.alignment() != 0 {
            return Err(AddressError::LoadMisaligned(address).into());
        }
        self.check_hart(hart)?;
        if let Some(table) = self.tables().get_mut(hart) {
            table.reserve_address(address, width);
        }
        trace!(hart, address, %width, "reservation added");
        self.notify();
        Ok(())
    }

    /// Checks and clears a reservation for `hart` (`sc.w` / `sc.d`).
    ///
    /// # Returns
    ///
    /// `Ok(true)` if `hart` held a matching reservation, which is then removed from every
    /// hart; `Ok(false)` otherwise, with no change. `AddressError::StoreMisaligned` if
    /// `address` is not aligned to `width`.
    pub fn unreserve_address(
        &self,
        hart: usize,
        address: u32,
        width: ReservationWidth,
    ) -> Result<bool, ReservationError> {
        if address % width.alignment() != 0 {
            return Err(AddressError::StoreMisaligned(address).into());
        }
        self.check_hart(hart)?;
        {
            let mut tables = self.tables();
            let held = tables
                .get(hart)
                .is_some_and(|table| table.contains(address, width));
            if !held {
                trace!(hart, address, %width, "store-conditional failed");
                return Ok(false);
            }
            tables
                .iter_mut()
                .for_each(|table| table.unreserve_address(address, width));
        }
        trace!(hart, address, %width, "reservation consumed");
        self.notify();
        Ok(true)
    }

    /// Returns `true` if `hart` holds a reservation matching or covering `address`.
    pub fn contains(
        &self,
        hart: usize,
        address: u32,
        width: ReservationWidth,
    ) -> Result<bool, ReservationError> {
        self.check_hart(hart)?;
        Ok(self
            .tables()
            .get(hart)
            .is_some_and(|table| table.contains(address, width)))
    }

    /// Returns a copy of the table of `hart`.
    pub fn snapshot(&self, hart: usize) -> Result<ReservationTable, ReservationError> {
        self.check_hart(hart)?;
        Ok(self.tables().get(hart).cloned().unwrap_or_default())
    }

    /// Drops every reservation on every hart.
    pub fn reset(&self) {
        self.tables().iter_mut().for_each(ReservationTable::reset);
        self.notify();
    }

    /// Renders all entries for display.
    ///
    /// # Returns
    ///
    /// `RESERVATION_CAPACITY` rows of `2 * harts` cells: for each hart the address as
    /// `0x%08x` followed by the width character, or `0x00000000` and a space for empty slots.
    pub fn all_addresses_as_strings(&self) -> Vec<Vec<String>> {
        let mut rows = vec![Vec::with_capacity(2 * self.harts); RESERVATION_CAPACITY];
        for table in &*self.tables() {
            let mut entries = table.entries();
            for row in &mut rows {
                match entries.next() {
                    Some(r) => {
                        row.push(format!("0x{:08x}", r.address));
                        row.push(r.width.as_char().to_string());
                    }
                    None => {
                        row.push(format!("0x{:08x}", 0));
                        row.push(" ".to_owned());
                    }
                }
            }
        }
        rows
    }

    /// Registers an observer and returns its handle.
    pub fn add_observer(&self, observer: Arc<dyn ReservationObserver>) -> ObserverId {
        let id = ObserverId::next();
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    /// Removes the observer registered under `id`. Returns `true` if one was removed.
    pub fn delete_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    fn notify(&self) {
        let observers: Vec<Arc<dyn ReservationObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        if observers.is_empty() {
            return;
        }
        let table = self.all_addresses_as_strings();
        for observer in observers {
            observer.reservations_changed(&table);
        }
    }
}

impl fmt::Debug for ReservationTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservationTables")
            .field("harts", &self.harts)
            .field("tables", &*self.tables())
            .finish_non_exhaustive()
    }
}
