//! Architectural Register cell.
//!
//! This module implements the single storage cell shared by every register file. It provides:
//! 1. **Storage:** A 64-bit value read without a lock; writes serialize on the owning register.
//! 2. **Variants:** Plain, masked, read-only and linked registers as one tagged type.
//! 3. **Reset:** A construction-time default that can be re-homed on reconfiguration.
//! 4. **Observability:** Per-register observer lists notified on reads and writes.
//!
//! Every setter returns the previous value so an external undo stack can be built
//! on top without this module knowing about it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::common::{AccessType, ObserverId, RegisterAccessNotice, RegisterObserver};

/// Storage behaviour of a [`Register`].
#[derive(Clone)]
pub enum RegisterKind {
    /// Ordinary read/write storage.
    Plain,

    /// Storage whose bits set in `mask` are preserved by [`Register::set_value`].
    Masked {
        /// Bits that are NOT writable.
        mask: u64,
    },

    /// Storage that ignores [`Register::set_value`]; only the backdoor writes it.
    ReadOnly,

    /// A view of the bits selected by `mask` inside `base`, shifted down to bit 0.
    Linked {
        /// Register owning the storage.
        base: Arc<Register>,
        /// Bits of `base` exposed through this register.
        mask: u64,
        /// Position of the lowest set bit of `mask`.
        shift: u32,
    },
}

impl fmt::Debug for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "Plain"),
            Self::Masked { mask } => write!(f, "Masked({mask:#x})"),
            Self::ReadOnly => write!(f, "ReadOnly"),
            Self::Linked { base, mask, shift } => {
                write!(f, "Linked({}, {mask:#x}, >>{shift})", base.name())
            }
        }
    }
}

type ObserverList = Vec<(ObserverId, Arc<dyn RegisterObserver>)>;

/// A named, numbered architectural register.
pub struct Register {
    name: Arc<str>,
    number: i32,
    reset_value: AtomicU64,
    value: AtomicU64,
    kind: RegisterKind,
    observers: RwLock<ObserverList>,
    update: Mutex<()>,
}

impl Register {
    fn with_kind(name: &str, number: i32, reset_value: u64, kind: RegisterKind) -> Self {
        Self {
            name: Arc::from(name),
            number,
            reset_value: AtomicU64::new(reset_value),
            value: AtomicU64::new(reset_value),
            kind,
            observers: RwLock::new(Vec::new()),
            update: Mutex::new(()),
        }
    }

    /// Creates a plain register holding `reset_value`.
    ///
    /// # Arguments
    ///
    /// * `name` - Register name (e.g. `"sp"`).
    /// * `number` - Register number inside its file.
    /// * `reset_value` - Value restored by [`Self::reset_value`].
    pub fn new(name: &str, number: i32, reset_value: u64) -> Self {
        Self::with_kind(name, number, reset_value, RegisterKind::Plain)
    }

    /// Creates a register whose bits set in `mask` cannot be changed by `set_value`.
    pub fn masked(name: &str, number: i32, reset_value: u64, mask: u64) -> Self {
        Self::with_kind(name, number, reset_value, RegisterKind::Masked { mask })
    }

    /// Creates a register that ignores ordinary writes.
    pub fn read_only(name: &str, number: i32, reset_value: u64) -> Self {
        Self::with_kind(name, number, reset_value, RegisterKind::ReadOnly)
    }

    /// Creates a register exposing the `mask` bits of `base`.
    ///
    /// # Arguments
    ///
    /// * `name` - Register name (e.g. `"fflags"`).
    /// * `number` - Register number inside its file.
    /// * `base` - Register that owns the storage.
    /// * `mask` - Bits of `base` visible through the new register.
    pub fn linked(name: &str, number: i32, base: Arc<Self>, mask: u64) -> Self {
        let shift = if mask == 0 { 0 } else { mask.trailing_zeros() };
        Self::with_kind(name, number, 0, RegisterKind::Linked { base, mask, shift })
    }

    /// Returns the register name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the register number.
    pub const fn number(&self) -> i32 {
        self.number
    }

    /// Returns the storage behaviour.
    pub const fn kind(&self) -> &RegisterKind {
        &self.kind
    }

    /// Returns the current value and emits a read notice.
    pub fn get_value(&self) -> u64 {
        let value = self.get_value_no_notify();
        self.notify(AccessType::Read);
        value
    }

    /// Returns the current value without notifying observers.
    pub fn get_value_no_notify(&self) -> u64 {
        match &self.kind {
            RegisterKind::Linked { base, mask, shift } => {
                (base.get_value_no_notify() & mask) >> shift
            }
            _ => self.value.load(Ordering::SeqCst),
        }
    }

    /// Stores `value`, emits a write notice and returns the previous value.
    ///
    /// Masked registers keep their masked bits; read-only registers ignore the write
    /// and return the current value without notifying.
    pub fn set_value(&self, value: u64) -> u64 {
        if matches!(self.kind, RegisterKind::ReadOnly) {
            return self.get_value_no_notify();
        }
        let old = self.store(value, true);
        self.notify(AccessType::Write);
        old
    }

    /// Stores `value` without notifying observers and returns the previous value.
    ///
    /// Used to apply undo restores and counter updates. The mask of a masked register
    /// is ignored and read-only registers are written.
    pub fn set_value_backdoor(&self, value: u64) -> u64 {
        self.store(value, false)
    }

    /// Writes through the storage lock shared with every register linked onto this one.
    fn store(&self, value: u64, apply_mask: bool) -> u64 {
        let (owner, writable, shift) = match &self.kind {
            RegisterKind::Linked { base, mask, shift } => (base.as_ref(), *mask, *shift),
            RegisterKind::Masked { mask } if apply_mask => (self, !mask, 0),
            _ => (self, u64::MAX, 0),
        };
        let _guard = owner.update.lock().unwrap_or_else(PoisonError::into_inner);
        let old = owner.value.load(Ordering::SeqCst);
        let merged = (value.wrapping_shl(shift) & writable) | (old & !writable);
        owner.value.store(merged, Ordering::SeqCst);
        match &self.kind {
            RegisterKind::Linked { .. } => (old & writable) >> shift,
            _ => old,
        }
    }

    /// Restores the reset value silently. Linked registers follow their base.
    pub fn reset_value(&self) {
        if !matches!(self.kind, RegisterKind::Linked { .. }) {
            let _guard = self.update.lock().unwrap_or_else(PoisonError::into_inner);
            self.value
                .store(self.reset_value.load(Ordering::SeqCst), Ordering::SeqCst);
        }
    }

    /// Redefines the value restored by [`Self::reset_value`].
    pub fn change_reset_value(&self, value: u64) {
        self.reset_value.store(value, Ordering::SeqCst);
    }

    /// Returns the value restored by [`Self::reset_value`].
    pub fn get_reset_value(&self) -> u64 {
        match &self.kind {
            RegisterKind::Linked { base, mask, shift } => (base.get_reset_value() & mask) >> shift,
            _ => self.reset_value.load(Ordering::SeqCst),
        }
    }

    /// Registers an observer and returns its handle.
    pub fn add_observer(&self, observer: Arc<dyn RegisterObserver>) -> ObserverId {
        let id = ObserverId::next();
        self.add_observer_with_id(id, observer);
        id
    }

    /// Registers an observer under an existing handle (bulk registration by register blocks).
    pub(crate) fn add_observer_with_id(&self, id: ObserverId, observer: Arc<dyn RegisterObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
    }

    /// Removes the observer registered under `id`. Returns `true` if one was removed.
    pub fn delete_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// Removes every observer.
    pub fn delete_observers(&self) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of registered observers.
    pub fn count_observers(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, access_type: AccessType) {
        let observers: Vec<Arc<dyn RegisterObserver>> = {
            let guard = self.observers.read().unwrap_or_else(PoisonError::into_inner);
            if guard.is_empty() {
                return;
            }
            guard.iter().map(|(_, o)| Arc::clone(o)).collect()
        };
        let notice = RegisterAccessNotice {
            access_type,
            register_name: Arc::clone(&self.name),
            register_number: self.number,
        };
        for observer in observers {
            observer.register_accessed(&notice);
        }
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("name", &self.name)
            .field("number", &self.number)
            .field("value", &format_args!("{:#x}", self.get_value_no_notify()))
            .field("kind", &self.kind)
            .finish()
    }
}
