//! Undo ("backstep") records.
//!
//! Every mutating operation on memory and the register files returns the value it
//! overwrote. When a [`Backstepper`] is attached, the same previous value is also pushed
//! as a [`RestoreRecord`] so a debugger can step the program backwards. This module provides:
//! 1. **Records:** One variant per kind of restorable state.
//! 2. **Sink:** The [`Backstepper`] trait, implemented by the undo stack owner.
//! 3. **Log:** [`RestoreLog`], a bounded in-memory sink usable as a ready-made undo stack.
//!
//! Records are applied back through [`crate::sim::Machine::restore`], which writes through
//! the backdoor paths so restoring does not record again.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Previous state captured before a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreRecord {
    /// A general-purpose register held `value`.
    Register {
        /// Register number.
        number: i32,
        /// Previous value.
        value: u64,
    },

    /// A floating-point register held `value` (raw 64-bit pattern).
    FloatingPointRegister {
        /// Register number.
        number: i32,
        /// Previous value.
        value: u64,
    },

    /// A control and status register held `value`.
    ControlAndStatusRegister {
        /// CSR number.
        number: i32,
        /// Previous value.
        value: u64,
    },

    /// The program counter held `value`.
    ProgramCounter {
        /// Previous value.
        value: u64,
    },

    /// The word at `address` held `value` (written through `set_word`).
    MemoryWord {
        /// Word address.
        address: u32,
        /// Previous contents.
        value: u32,
    },

    /// The half-word at `address` held `value`.
    MemoryHalf {
        /// Half-word address.
        address: u32,
        /// Previous contents.
        value: u32,
    },

    /// The byte at `address` held `value`.
    MemoryByte {
        /// Byte address.
        address: u32,
        /// Previous contents.
        value: u32,
    },

    /// The raw word at `address` held `value` (written through `set_raw_word`).
    MemoryRawWord {
        /// Word address.
        address: u32,
        /// Previous contents.
        value: u32,
    },

    /// The double-word at `address` held `value`.
    MemoryDoubleWord {
        /// Double-word address.
        address: u32,
        /// Previous contents.
        value: u64,
    },
}

/// Receiver of undo records.
pub trait Backstepper: Send + Sync {
    /// Pushes one record. Called after the mutation succeeded.
    fn record(&self, record: RestoreRecord);
}

/// Optional backstepper shared by memory and the register files.
#[derive(Default)]
pub(crate) struct BackstepSlot(RwLock<Option<Arc<dyn Backstepper>>>);

impl BackstepSlot {
    pub(crate) fn set(&self, backstepper: Option<Arc<dyn Backstepper>>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = backstepper;
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.0.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Pushes the record built by `make` if a backstepper is attached.
    pub(crate) fn record(&self, make: impl FnOnce() -> RestoreRecord) {
        let backstepper = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(backstepper) = backstepper {
            backstepper.record(make());
        }
    }
}

impl fmt::Debug for BackstepSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackstepSlot(attached: {})", self.is_attached())
    }
}

/// Bounded undo stack.
///
/// Oldest records are discarded once `capacity` is reached.
#[derive(Debug)]
pub struct RestoreLog {
    capacity: usize,
    records: Mutex<VecDeque<RestoreRecord>>,
}

impl RestoreLog {
    /// Creates an empty log holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Removes and returns the newest record.
    pub fn pop(&self) -> Option<RestoreRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_back()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards every record.
    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns a copy of the stored records, oldest first.
    pub fn snapshot(&self) -> Vec<RestoreRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }
}

impl Backstepper for RestoreLog {
    fn record(&self, record: RestoreRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.len() == self.capacity {
            let _ = records.pop_front();
        }
        records.push_back(record);
    }
}
