//! Register Block.
//!
//! A register block is a fixed collection of [`Register`]s addressed by number or by name.
//! It provides:
//! 1. **Sparse Lookup:** Numbers need not be contiguous (CSR numbers are sparse addresses).
//! 2. **Name Lookup:** Exact names or `prefix` + decimal number (`x5`, `f12`).
//! 3. **Bulk Operations:** Reset and observer registration across every register.
//!
//! Lookups of unknown names or numbers yield `None` instead of an error: assemblers and
//! argument parsers routinely probe tokens to see whether they name a register.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::common::{ObserverId, RegisterObserver};

use super::register::Register;

/// Ordered, sparsely numbered collection of registers.
#[derive(Debug)]
pub struct RegisterBlock {
    prefix: char,
    registers: Vec<Arc<Register>>,
    by_number: BTreeMap<i32, usize>,
}

impl RegisterBlock {
    /// Creates a block from registers with unique numbers.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Character introducing numeric names (`'x'`, `'f'`).
    /// * `registers` - Registers in display order.
    pub fn new(prefix: char, registers: Vec<Arc<Register>>) -> Self {
        let mut by_number = BTreeMap::new();
        for (position, register) in registers.iter().enumerate() {
            let previous = by_number.insert(register.number(), position);
            debug_assert!(
                previous.is_none(),
                "duplicate register number {}",
                register.number()
            );
        }
        Self {
            prefix,
            registers,
            by_number,
        }
    }

    /// Returns the numeric-name prefix.
    pub const fn prefix(&self) -> char {
        self.prefix
    }

    /// Returns the number of registers in the block.
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Returns `true` if the block holds no registers.
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Returns all registers in display order.
    pub fn get_registers(&self) -> &[Arc<Register>] {
        &self.registers
    }

    /// Finds a register by number.
    pub fn get_register(&self, number: i32) -> Option<&Arc<Register>> {
        self.by_number
            .get(&number)
            .and_then(|&position| self.registers.get(position))
    }

    /// Finds a register by exact name, or by `prefix` followed by a decimal number.
    ///
    /// Numbers with leading zeros (`x01`) and names shorter than two characters are rejected.
    pub fn get_register_by_name(&self, name: &str) -> Option<&Arc<Register>> {
        if name.len() < 2 {
            return None;
        }
        if let Some(register) = self.registers.iter().find(|r| r.name() == name) {
            return Some(register);
        }
        self.parse_prefixed_number(name)
            .and_then(|number| self.get_register(number))
    }

    fn parse_prefixed_number(&self, name: &str) -> Option<i32> {
        let digits = name.strip_prefix(self.prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok()
    }

    /// Returns the list position of `register`, matched by identity.
    pub fn get_register_position(&self, register: &Register) -> Option<usize> {
        self.registers
            .iter()
            .position(|r| std::ptr::eq(Arc::as_ptr(r), register))
    }

    /// Writes `value` to register `number` and returns the previous value.
    ///
    /// # Returns
    ///
    /// `None` when no register has that number.
    pub fn update_register(&self, number: i32, value: u64) -> Option<u64> {
        self.get_register(number).map(|r| r.set_value(value))
    }

    /// Writes `value` to the named register and returns the previous value.
    pub fn update_register_by_name(&self, name: &str, value: u64) -> Option<u64> {
        self.get_register_by_name(name).map(|r| r.set_value(value))
    }

    /// Reads register `number`, notifying its observers.
    pub fn get_value(&self, number: i32) -> Option<u64> {
        self.get_register(number).map(|r| r.get_value())
    }

    /// Reads the named register, notifying its observers.
    pub fn get_value_by_name(&self, name: &str) -> Option<u64> {
        self.get_register_by_name(name).map(|r| r.get_value())
    }

    /// Restores every register to its reset value.
    pub fn reset_registers(&self) {
        for register in &self.registers {
            register.reset_value();
        }
    }

    /// Registers `observer` on every register under one handle.
    pub fn add_registers_observer(&self, observer: Arc<dyn RegisterObserver>) -> ObserverId {
        let id = ObserverId::next();
        self.add_registers_observer_with_id(id, &observer);
        id
    }

    pub(crate) fn add_registers_observer_with_id(
        &self,
        id: ObserverId,
        observer: &Arc<dyn RegisterObserver>,
    ) {
        for register in &self.registers {
            register.add_observer_with_id(id, Arc::clone(observer));
        }
    }

    /// Withdraws the observer registered under `id` from every register.
    pub fn delete_registers_observer(&self, id: ObserverId) {
        for register in &self.registers {
            let _ = register.delete_observer(id);
        }
    }
}
