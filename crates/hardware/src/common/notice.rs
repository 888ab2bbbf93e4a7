//! Access Notices and Observer plumbing.
//!
//! Debugger front ends and tools watch the architectural state through notices delivered
//! synchronously by the thread that performed the access. This module provides:
//! 1. **Notices:** Value types describing one memory or register access.
//! 2. **Observer Traits:** Callback interfaces, implemented for plain closures.
//! 3. **Handles:** [`ObserverId`] tokens used to withdraw a registration.
//!
//! Callbacks run on the mutating thread after the state change; they must not block and
//! must redirect to their own UI thread themselves if they need one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::data::AccessType;

/// Notice describing one observed memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryAccessNotice {
    /// Read or write.
    pub access_type: AccessType,
    /// Byte address of the access.
    pub address: u32,
    /// Length of the access in bytes (1, 2, 4).
    pub length: u32,
    /// Value read, or value written.
    pub value: u32,
}

impl MemoryAccessNotice {
    /// Creates a memory access notice.
    pub const fn new(access_type: AccessType, address: u32, length: u32, value: u32) -> Self {
        Self {
            access_type,
            address,
            length,
            value,
        }
    }
}

/// Notice describing one observed register access.
///
/// Register notices carry no value; observers re-read the register if they need it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterAccessNotice {
    /// Read or write.
    pub access_type: AccessType,
    /// Name of the accessed register.
    pub register_name: Arc<str>,
    /// Number of the accessed register.
    pub register_number: i32,
}

/// Any access notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessNotice {
    /// A memory access.
    Memory(MemoryAccessNotice),
    /// A register access.
    Register(RegisterAccessNotice),
}

impl AccessNotice {
    /// Returns the access direction of the wrapped notice.
    pub fn access_type(&self) -> AccessType {
        match self {
            Self::Memory(n) => n.access_type,
            Self::Register(n) => n.access_type,
        }
    }
}

impl From<MemoryAccessNotice> for AccessNotice {
    fn from(notice: MemoryAccessNotice) -> Self {
        Self::Memory(notice)
    }
}

impl From<RegisterAccessNotice> for AccessNotice {
    fn from(notice: RegisterAccessNotice) -> Self {
        Self::Register(notice)
    }
}

/// Handle identifying one observer registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Allocates a fresh, process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Receiver of memory access notices.
pub trait MemoryObserver: Send + Sync {
    /// Called after an observed memory access completes.
    fn memory_accessed(&self, notice: &MemoryAccessNotice);
}

impl<F> MemoryObserver for F
where
    F: Fn(&MemoryAccessNotice) + Send + Sync,
{
    fn memory_accessed(&self, notice: &MemoryAccessNotice) {
        self(notice);
    }
}

/// Receiver of register access notices.
pub trait RegisterObserver: Send + Sync {
    /// Called after an observed register access completes.
    fn register_accessed(&self, notice: &RegisterAccessNotice);
}

impl<F> RegisterObserver for F
where
    F: Fn(&RegisterAccessNotice) + Send + Sync,
{
    fn register_accessed(&self, notice: &RegisterAccessNotice) {
        self(notice);
    }
}
