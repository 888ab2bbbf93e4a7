//! Access Types.
//!
//! This module defines the classification of observable accesses. Access types are
//! used for the following:
//! 1. **Notices:** Tagging memory and register notices as reads or writes.
//! 2. **Fault Generation:** Choosing the load or store flavour of an address error.

use std::fmt;

/// Direction of an observed access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Data read access (loads, register reads).
    Read,

    /// Data write access (stores, register writes).
    Write,
}

impl AccessType {
    /// Returns `true` for [`AccessType::Read`].
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read)
    }

    /// Returns `true` for [`AccessType::Write`].
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}
