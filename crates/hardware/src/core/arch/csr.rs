//! Control and Status Register (CSR) file.
//!
//! This module implements the user-level CSR subsystem of the simulated hart. It provides:
//! 1. **Address Definitions:** Constants for every implemented CSR number.
//! 2. **Field Composition:** `fflags`/`frm` as linked views of `fcsr`, and the `*h`
//!    counter halves as linked views of the 64-bit counters.
//! 3. **Access Control:** Writes to the read-only CSR space (`0xC00`-`0xFFF`) are ignored;
//!    the backdoor path used for counter maintenance bypasses that check.
//! 4. **Helpers:** Set-bits and clear-bits updates for `csrrs` / `csrrc`.

use std::sync::Arc;

use tracing::trace;

use crate::common::{ObserverId, RegisterObserver};
use crate::core::backstep::{BackstepSlot, Backstepper, RestoreRecord};

use super::block::RegisterBlock;
use super::register::Register;

/// User status register CSR number.
pub const USTATUS: i32 = 0x000;

/// Floating-point accrued exceptions CSR number (view of `fcsr[4:0]`).
pub const FFLAGS: i32 = 0x001;

/// Floating-point dynamic rounding mode CSR number (view of `fcsr[7:5]`).
pub const FRM: i32 = 0x002;

/// Floating-point control and status CSR number.
pub const FCSR: i32 = 0x003;

/// User interrupt enable CSR number.
pub const UIE: i32 = 0x004;

/// User trap vector base address CSR number.
pub const UTVEC: i32 = 0x005;

/// User scratch CSR number.
pub const USCRATCH: i32 = 0x040;

/// User exception program counter CSR number.
pub const UEPC: i32 = 0x041;

/// User trap cause CSR number.
pub const UCAUSE: i32 = 0x042;

/// User trap value CSR number.
pub const UTVAL: i32 = 0x043;

/// User interrupt pending CSR number.
pub const UIP: i32 = 0x044;

/// Cycle counter CSR number.
pub const CYCLE: i32 = 0xC00;

/// Real-time counter CSR number.
pub const TIME: i32 = 0xC01;

/// Retired instruction counter CSR number.
pub const INSTRET: i32 = 0xC02;

/// Upper half of the cycle counter.
pub const CYCLEH: i32 = 0xC80;

/// Upper half of the real-time counter.
pub const TIMEH: i32 = 0xC81;

/// Upper half of the retired instruction counter.
pub const INSTRETH: i32 = 0xC82;

/// Bits of `ustatus` writable by software (UIE, UPIE).
pub const USTATUS_WRITABLE: u64 = 0x11;

/// Bits of `fcsr` writable by software (frm and fflags).
pub const FCSR_WRITABLE: u64 = 0xFF;

/// Bits of `fcsr` exposed as `fflags`.
pub const FFLAGS_MASK: u64 = 0x1F;

/// Bits of `fcsr` exposed as `frm`.
pub const FRM_MASK: u64 = 0xE0;

/// Bits of a 64-bit counter exposed by its `*h` register.
pub const COUNTER_HIGH_MASK: u64 = 0xFFFF_FFFF_0000_0000;

/// Returns `true` if `number` lies in the read-only CSR space.
pub const fn is_read_only_number(number: i32) -> bool {
    (number >> 10) == 3
}

/// Control and status register file.
#[derive(Debug)]
pub struct ControlAndStatusRegisterFile {
    block: RegisterBlock,
    backstep: BackstepSlot,
}

impl Default for ControlAndStatusRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlAndStatusRegisterFile {
    /// Creates the CSR file with every register cleared.
    pub fn new() -> Self {
        let fcsr = Arc::new(Register::masked("fcsr", FCSR, 0, !FCSR_WRITABLE));
        let cycle = Arc::new(Register::read_only("cycle", CYCLE, 0));
        let time = Arc::new(Register::read_only("time", TIME, 0));
        let instret = Arc::new(Register::read_only("instret", INSTRET, 0));

        let registers = vec![
            Arc::new(Register::masked("ustatus", USTATUS, 0, !USTATUS_WRITABLE)),
            Arc::new(Register::linked("fflags", FFLAGS, Arc::clone(&fcsr), FFLAGS_MASK)),
            Arc::new(Register::linked("frm", FRM, Arc::clone(&fcsr), FRM_MASK)),
            fcsr,
            Arc::new(Register::new("uie", UIE, 0)),
            Arc::new(Register::new("utvec", UTVEC, 0)),
            Arc::new(Register::new("uscratch", USCRATCH, 0)),
            Arc::new(Register::new("uepc", UEPC, 0)),
            Arc::new(Register::new("ucause", UCAUSE, 0)),
            Arc::new(Register::new("utval", UTVAL, 0)),
            Arc::new(Register::new("uip", UIP, 0)),
            Arc::clone(&cycle),
            Arc::clone(&time),
            Arc::clone(&instret),
            Arc::new(Register::linked("cycleh", CYCLEH, cycle, COUNTER_HIGH_MASK)),
            Arc::new(Register::linked("timeh", TIMEH, time, COUNTER_HIGH_MASK)),
            Arc::new(Register::linked("instreth", INSTRETH, instret, COUNTER_HIGH_MASK)),
        ];
        Self {
            block: RegisterBlock::new('_', registers),
            backstep: BackstepSlot::default(),
        }
    }

    /// Attaches or detaches the undo sink.
    pub fn set_backstepper(&self, backstepper: Option<Arc<dyn Backstepper>>) {
        self.backstep.set(backstepper);
    }

    fn write(&self, register: &Register, value: u64) -> Option<u64> {
        let number = register.number();
        if is_read_only_number(number) {
            trace!(csr = register.name(), "write to read-only csr ignored");
            return None;
        }
        let old = register.set_value(value);
        self.backstep
            .record(|| RestoreRecord::ControlAndStatusRegister { number, value: old });
        Some(old)
    }

    /// Writes `value` to CSR `number`.
    ///
    /// # Returns
    ///
    /// The previous value, or `None` when the CSR is unmapped or lies in the read-only
    /// space (the write is then ignored).
    pub fn update_register(&self, number: i32, value: u64) -> Option<u64> {
        self.block
            .get_register(number)
            .and_then(|r| self.write(r, value))
    }

    /// Writes `value` to the named CSR.
    pub fn update_register_by_name(&self, name: &str, value: u64) -> Option<u64> {
        self.block
            .get_register_by_name(name)
            .and_then(|r| self.write(r, value))
    }

    /// Writes `value` to CSR `number` silently, bypassing the read-only check and masks.
    ///
    /// Used to advance the counters and to apply undo restores.
    pub fn update_register_backdoor(&self, number: i32, value: u64) -> Option<u64> {
        self.block
            .get_register(number)
            .map(|r| r.set_value_backdoor(value))
    }

    /// Backdoor write to the named CSR.
    pub fn update_register_backdoor_by_name(&self, name: &str, value: u64) -> Option<u64> {
        self.block
            .get_register_by_name(name)
            .map(|r| r.set_value_backdoor(value))
    }

    /// Sets the bits of `mask` in CSR `number` (`csrrs`).
    pub fn or_register(&self, number: i32, mask: u64) -> Option<u64> {
        let register = self.block.get_register(number)?;
        self.write(register, register.get_value() | mask)
    }

    /// Clears the bits of `mask` in CSR `number` (`csrrc`).
    pub fn clear_register(&self, number: i32, mask: u64) -> Option<u64> {
        let register = self.block.get_register(number)?;
        self.write(register, register.get_value() & !mask)
    }

    /// Returns the low 32 bits of CSR `number` as a signed value.
    pub fn get_value(&self, number: i32) -> Option<i32> {
        self.block.get_value(number).map(|v| v as i32)
    }

    /// Returns the full 64-bit value of CSR `number`.
    pub fn get_value_long(&self, number: i32) -> Option<u64> {
        self.block.get_value(number)
    }

    /// Returns CSR `number` without notifying observers.
    pub fn get_value_no_notify(&self, number: i32) -> Option<u64> {
        self.block
            .get_register(number)
            .map(|r| r.get_value_no_notify())
    }

    /// Returns the low 32 bits of the named CSR as a signed value.
    pub fn get_value_by_name(&self, name: &str) -> Option<i32> {
        self.block.get_value_by_name(name).map(|v| v as i32)
    }

    /// Returns the full 64-bit value of the named CSR.
    pub fn get_value_long_by_name(&self, name: &str) -> Option<u64> {
        self.block.get_value_by_name(name)
    }

    /// Returns the number of the named CSR.
    pub fn get_register_number(&self, name: &str) -> Option<i32> {
        self.block.get_register_by_name(name).map(|r| r.number())
    }

    /// Finds a CSR by number.
    pub fn get_register(&self, number: i32) -> Option<&Arc<Register>> {
        self.block.get_register(number)
    }

    /// Finds a CSR by name.
    pub fn get_register_by_name(&self, name: &str) -> Option<&Arc<Register>> {
        self.block.get_register_by_name(name)
    }

    /// Returns the CSRs in display order.
    pub fn get_registers(&self) -> &[Arc<Register>] {
        self.block.get_registers()
    }

    /// Returns the display position of `register`.
    pub fn get_register_position(&self, register: &Register) -> Option<usize> {
        self.block.get_register_position(register)
    }

    /// Clears every CSR to its reset value.
    pub fn reset_registers(&self) {
        self.block.reset_registers();
    }

    /// Registers `observer` on every CSR under one handle.
    pub fn add_registers_observer(&self, observer: Arc<dyn RegisterObserver>) -> ObserverId {
        self.block.add_registers_observer(observer)
    }

    /// Withdraws the observer registered under `id`.
    pub fn delete_registers_observer(&self, id: ObserverId) {
        self.block.delete_registers_observer(id);
    }
}
