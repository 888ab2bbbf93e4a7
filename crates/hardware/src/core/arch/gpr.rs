//! RISC-V General-Purpose Register File.
//!
//! This module implements the integer register file of the simulated hart. It performs
//! the following:
//! 1. **Storage:** Maintains 32 integer registers (`x0`-`x31`) under their ABI names.
//! 2. **Invariant Enforcement:** Ensures that register `x0` discards every write.
//! 3. **Program Counter:** Holds the PC as register number -1 outside the numbered block.
//! 4. **Undo:** Records the previous value of every write with an attached backstepper.
//!
//! The stack pointer, global pointer and PC reset values follow the current memory
//! configuration and are re-homed by [`RegisterFile::apply_configuration`].

use std::sync::Arc;

use tracing::debug;

use crate::common::constants::INSTRUCTION_LENGTH;
use crate::common::{ObserverId, RegisterObserver};
use crate::core::backstep::{BackstepSlot, Backstepper, RestoreRecord};
use crate::isa::symbol::{START_LABEL, SymbolTable};
use crate::soc::memory::configuration::MemoryConfiguration;

use super::block::RegisterBlock;
use super::register::Register;

/// Number of the stack pointer register (`sp`).
pub const STACK_POINTER_REGISTER: i32 = 2;

/// Number of the global pointer register (`gp`).
pub const GLOBAL_POINTER_REGISTER: i32 = 3;

/// Number given to the program counter.
pub const PROGRAM_COUNTER_NUMBER: i32 = -1;

/// ABI names of `x0`-`x31`.
const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// General-purpose register file plus program counter.
#[derive(Debug)]
pub struct RegisterFile {
    block: RegisterBlock,
    program_counter: Arc<Register>,
    backstep: BackstepSlot,
}

impl RegisterFile {
    /// Creates a register file whose reset values follow `configuration`.
    ///
    /// # Arguments
    ///
    /// * `configuration` - Layout supplying the `sp`, `gp` and PC reset values.
    pub fn new(configuration: &MemoryConfiguration) -> Self {
        let registers = ABI_NAMES
            .iter()
            .zip(0..)
            .map(|(name, number)| {
                let reset = match number {
                    STACK_POINTER_REGISTER => u64::from(configuration.stack_pointer()),
                    GLOBAL_POINTER_REGISTER => u64::from(configuration.global_pointer()),
                    _ => 0,
                };
                Arc::new(Register::new(name, number, reset))
            })
            .collect();
        Self {
            block: RegisterBlock::new('x', registers),
            program_counter: Arc::new(Register::new(
                "pc",
                PROGRAM_COUNTER_NUMBER,
                u64::from(configuration.text_base_address()),
            )),
            backstep: BackstepSlot::default(),
        }
    }

    /// Attaches or detaches the undo sink.
    pub fn set_backstepper(&self, backstepper: Option<Arc<dyn Backstepper>>) {
        self.backstep.set(backstepper);
    }

    /// Re-homes the `sp`, `gp` and PC reset values to `configuration`.
    ///
    /// Current values are untouched; call [`Self::reset_registers`] to apply them.
    pub fn apply_configuration(&self, configuration: &MemoryConfiguration) {
        let sp = u64::from(configuration.stack_pointer());
        let gp = u64::from(configuration.global_pointer());
        let pc = u64::from(configuration.text_base_address());
        if let Some(r) = self.block.get_register(STACK_POINTER_REGISTER) {
            r.change_reset_value(sp);
        }
        if let Some(r) = self.block.get_register(GLOBAL_POINTER_REGISTER) {
            r.change_reset_value(gp);
        }
        self.program_counter.change_reset_value(pc);
        debug!(sp, gp, pc, "register reset values re-homed");
    }

    fn resolve(&self, name: &str) -> Option<&Arc<Register>> {
        if name == "fp" {
            return self.block.get_register(8);
        }
        self.block.get_register_by_name(name)
    }

    fn write(&self, register: &Register, value: u64, record: bool) -> u64 {
        let number = register.number();
        if number == 0 {
            return 0;
        }
        let old = register.set_value(value);
        if record {
            self.backstep
                .record(|| RestoreRecord::Register { number, value: old });
        }
        old
    }

    /// Writes `value` to register `number`.
    ///
    /// # Returns
    ///
    /// The previous value, `Some(0)` for `x0` (write discarded), or `None` when no register
    /// has that number.
    pub fn update_register(&self, number: i32, value: u64) -> Option<u64> {
        self.block
            .get_register(number)
            .map(|r| self.write(r, value, true))
    }

    /// Writes `value` to the register called `name` (ABI name, `xN` or `fp`).
    pub fn update_register_by_name(&self, name: &str, value: u64) -> Option<u64> {
        self.resolve(name).map(|r| self.write(r, value, true))
    }

    pub(crate) fn restore_register(&self, number: i32, value: u64) {
        if let Some(r) = self.block.get_register(number) {
            let _ = self.write(r, value, false);
        }
    }

    /// Returns the low 32 bits of register `number` as a signed value.
    pub fn get_value(&self, number: i32) -> Option<i32> {
        self.block.get_value(number).map(|v| v as i32)
    }

    /// Returns the full 64-bit value of register `number`.
    pub fn get_value_long(&self, number: i32) -> Option<u64> {
        self.block.get_value(number)
    }

    /// Returns the low 32 bits of the named register as a signed value.
    pub fn get_value_by_name(&self, name: &str) -> Option<i32> {
        self.resolve(name).map(|r| r.get_value() as i32)
    }

    /// Returns the full 64-bit value of the named register.
    pub fn get_value_long_by_name(&self, name: &str) -> Option<u64> {
        self.resolve(name).map(|r| r.get_value())
    }

    /// Returns the number of the named register.
    pub fn get_register_number(&self, name: &str) -> Option<i32> {
        self.resolve(name).map(|r| r.number())
    }

    /// Finds a register by name (ABI name, `xN` or `fp`).
    pub fn get_register_by_name(&self, name: &str) -> Option<&Arc<Register>> {
        self.resolve(name)
    }

    /// Finds a register by number.
    pub fn get_register(&self, number: i32) -> Option<&Arc<Register>> {
        self.block.get_register(number)
    }

    /// Returns the 32 integer registers in number order.
    pub fn get_registers(&self) -> &[Arc<Register>] {
        self.block.get_registers()
    }

    /// Advances the program counter by one instruction.
    pub fn increment_pc(&self) {
        let next = self.get_program_counter().wrapping_add(INSTRUCTION_LENGTH);
        let _ = self.program_counter.set_value(u64::from(next));
    }

    /// Sets the program counter and returns its previous value.
    pub fn set_program_counter(&self, value: u32) -> u32 {
        let old = self.program_counter.set_value(u64::from(value));
        self.backstep
            .record(|| RestoreRecord::ProgramCounter { value: old });
        old as u32
    }

    pub(crate) fn restore_program_counter(&self, value: u64) {
        let _ = self.program_counter.set_value(value);
    }

    /// Returns the program counter.
    pub fn get_program_counter(&self) -> u32 {
        self.program_counter.get_value() as u32
    }

    /// Returns the PC reset value (text segment base of the current configuration).
    pub fn get_initial_program_counter(&self) -> u32 {
        self.program_counter.get_reset_value() as u32
    }

    /// Returns the program counter register.
    pub fn program_counter_register(&self) -> &Arc<Register> {
        &self.program_counter
    }

    /// Sets the program counter to `value` without recording an undo step.
    pub fn initialize_program_counter(&self, value: u32) {
        let _ = self.program_counter.set_value(u64::from(value));
    }

    /// Sets the program counter to the program entry point.
    ///
    /// # Arguments
    ///
    /// * `start_at_main` - Whether the global `main` label should be preferred.
    /// * `symbols` - Global symbol table of the assembled program.
    /// * `in_text` - Predicate telling whether an address lies in the text segment.
    ///
    /// # Returns
    ///
    /// The chosen address: `main` when enabled, defined and inside the text segment,
    /// otherwise the PC reset value.
    pub fn initialize_program_counter_at_main(
        &self,
        start_at_main: bool,
        symbols: &dyn SymbolTable,
        in_text: impl Fn(u32) -> bool,
    ) -> u32 {
        let entry = symbols
            .address_of(START_LABEL)
            .filter(|&main| start_at_main && in_text(main))
            .unwrap_or_else(|| self.get_initial_program_counter());
        self.initialize_program_counter(entry);
        entry
    }

    /// Restores every register and the program counter to its reset value.
    pub fn reset_registers(&self) {
        self.block.reset_registers();
        self.program_counter.reset_value();
    }

    /// Registers `observer` on every register and the program counter under one handle.
    pub fn add_registers_observer(&self, observer: Arc<dyn RegisterObserver>) -> ObserverId {
        let id = ObserverId::next();
        self.block.add_registers_observer_with_id(id, &observer);
        self.program_counter.add_observer_with_id(id, observer);
        id
    }

    /// Withdraws the observer registered under `id`.
    pub fn delete_registers_observer(&self, id: ObserverId) {
        self.block.delete_registers_observer(id);
        let _ = self.program_counter.delete_observer(id);
    }
}
