//! Global symbol lookup used to pick the program entry point.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Label the program counter starts at when "start at main" is enabled.
pub const START_LABEL: &str = "main";

/// Read-only view of the assembler's global symbol table.
pub trait SymbolTable {
    /// Returns the address bound to the global `label`.
    fn address_of(&self, label: &str) -> Option<u32>;
}

impl<S: BuildHasher> SymbolTable for HashMap<String, u32, S> {
    fn address_of(&self, label: &str) -> Option<u32> {
        self.get(label).copied()
    }
}

impl SymbolTable for BTreeMap<String, u32> {
    fn address_of(&self, label: &str) -> Option<u32> {
        self.get(label).copied()
    }
}

impl<F> SymbolTable for F
where
    F: Fn(&str) -> Option<u32>,
{
    fn address_of(&self, label: &str) -> Option<u32> {
        self(label)
    }
}
