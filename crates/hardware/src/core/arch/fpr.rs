//! RISC-V Floating-Point Register File.
//!
//! This module implements the floating-point register file for the RISC-V architecture.
//! It performs the following:
//! 1. **Storage:** Maintains 32 floating-point registers (`f0`-`f31`) as raw 64-bit patterns.
//! 2. **NaN-Boxing:** Single-precision values are stored with the upper 32 bits set, and
//!    read back as the canonical quiet NaN when that box is broken.
//! 3. **Type Conversion:** Converts between `f32`/`f64` and the stored bit patterns.

use std::sync::Arc;

use crate::common::constants::{CANONICAL_NAN_F32, NAN_BOX_MASK};
use crate::common::{ObserverId, RegisterObserver};
use crate::core::backstep::{BackstepSlot, Backstepper, RestoreRecord};

use super::block::RegisterBlock;
use super::register::Register;

/// ABI names of `f0`-`f31`.
const ABI_NAMES: [&str; 32] = [
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7", "fs0", "fs1", "fa0", "fa1", "fa2",
    "fa3", "fa4", "fa5", "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7", "fs8", "fs9",
    "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];

/// Boxes a single-precision pattern into a 64-bit register value.
pub const fn nan_box(bits: u32) -> u64 {
    NAN_BOX_MASK | bits as u64
}

/// Extracts a single-precision pattern, yielding the canonical NaN for unboxed values.
pub const fn nan_unbox(value: u64) -> u32 {
    if value & NAN_BOX_MASK == NAN_BOX_MASK {
        value as u32
    } else {
        CANONICAL_NAN_F32
    }
}

/// Floating-point register file.
#[derive(Debug)]
pub struct FloatingPointRegisterFile {
    block: RegisterBlock,
    backstep: BackstepSlot,
}

impl Default for FloatingPointRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl FloatingPointRegisterFile {
    /// Creates a register file with every register cleared to zero.
    pub fn new() -> Self {
        let registers = ABI_NAMES
            .iter()
            .zip(0..)
            .map(|(name, number)| Arc::new(Register::new(name, number, 0)))
            .collect();
        Self {
            block: RegisterBlock::new('f', registers),
            backstep: BackstepSlot::default(),
        }
    }

    /// Attaches or detaches the undo sink.
    pub fn set_backstepper(&self, backstepper: Option<Arc<dyn Backstepper>>) {
        self.backstep.set(backstepper);
    }

    fn write(&self, register: &Register, value: u64, record: bool) -> u64 {
        let old = register.set_value(value);
        if record {
            let number = register.number();
            self.backstep
                .record(|| RestoreRecord::FloatingPointRegister { number, value: old });
        }
        old
    }

    /// Stores a single-precision pattern, NaN-boxed, and returns the previous raw value.
    ///
    /// # Arguments
    ///
    /// * `number` - Register number (0-31).
    /// * `bits` - IEEE 754 single-precision bit pattern.
    pub fn update_register(&self, number: i32, bits: u32) -> Option<u64> {
        self.update_register_long(number, nan_box(bits))
    }

    /// Stores a raw 64-bit pattern and returns the previous raw value.
    pub fn update_register_long(&self, number: i32, value: u64) -> Option<u64> {
        self.block
            .get_register(number)
            .map(|r| self.write(r, value, true))
    }

    /// Stores a single-precision pattern, NaN-boxed, into the named register.
    pub fn update_register_by_name(&self, name: &str, bits: u32) -> Option<u64> {
        self.block
            .get_register_by_name(name)
            .map(|r| self.write(r, nan_box(bits), true))
    }

    pub(crate) fn restore_register(&self, number: i32, value: u64) {
        if let Some(r) = self.block.get_register(number) {
            let _ = self.write(r, value, false);
        }
    }

    /// Returns the single-precision pattern held in register `number`.
    ///
    /// # Returns
    ///
    /// The low 32 bits when the value is properly NaN-boxed, `0x7FC00000` otherwise.
    pub fn get_value(&self, number: i32) -> Option<u32> {
        self.block.get_value(number).map(nan_unbox)
    }

    /// Returns the raw 64-bit pattern of register `number`.
    pub fn get_value_long(&self, number: i32) -> Option<u64> {
        self.block.get_value(number)
    }

    /// Returns the single-precision pattern of the named register.
    pub fn get_value_by_name(&self, name: &str) -> Option<u32> {
        self.block.get_value_by_name(name).map(nan_unbox)
    }

    /// Returns the raw 64-bit pattern of the named register.
    pub fn get_value_long_by_name(&self, name: &str) -> Option<u64> {
        self.block.get_value_by_name(name)
    }

    /// Stores `value` as a NaN-boxed single-precision float.
    pub fn set_register_to_float(&self, number: i32, value: f32) -> Option<u64> {
        self.update_register(number, value.to_bits())
    }

    /// Reads register `number` as a single-precision float.
    pub fn get_float_from_register(&self, number: i32) -> Option<f32> {
        self.get_value(number).map(f32::from_bits)
    }

    /// Reads the named register as a single-precision float.
    pub fn get_float_from_register_by_name(&self, name: &str) -> Option<f32> {
        self.get_value_by_name(name).map(f32::from_bits)
    }

    /// Stores `value` as a double-precision float.
    pub fn set_register_to_double(&self, number: i32, value: f64) -> Option<u64> {
        self.update_register_long(number, value.to_bits())
    }

    /// Reads register `number` as a double-precision float.
    pub fn get_double_from_register(&self, number: i32) -> Option<f64> {
        self.get_value_long(number).map(f64::from_bits)
    }

    /// Reads the named register as a double-precision float.
    pub fn get_double_from_register_by_name(&self, name: &str) -> Option<f64> {
        self.get_value_long_by_name(name).map(f64::from_bits)
    }

    /// Returns the number of the named register.
    pub fn get_register_number(&self, name: &str) -> Option<i32> {
        self.block.get_register_by_name(name).map(|r| r.number())
    }

    /// Finds a register by name.
    pub fn get_register_by_name(&self, name: &str) -> Option<&Arc<Register>> {
        self.block.get_register_by_name(name)
    }

    /// Returns the 32 floating-point registers in number order.
    pub fn get_registers(&self) -> &[Arc<Register>] {
        self.block.get_registers()
    }

    /// Clears every register to its reset value.
    pub fn reset_registers(&self) {
        self.block.reset_registers();
    }

    /// Registers `observer` on every register under one handle.
    pub fn add_registers_observer(&self, observer: Arc<dyn RegisterObserver>) -> ObserverId {
        self.block.add_registers_observer(observer)
    }

    /// Withdraws the observer registered under `id`.
    pub fn delete_registers_observer(&self, id: ObserverId) {
        self.block.delete_registers_observer(id);
    }
}
