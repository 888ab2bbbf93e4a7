//! # Floating-Point Register (FPR) Tests
//!
//! This module contains unit tests for the floating-point register file. It verifies
//! reads and writes of the 32 registers, name lookup, and the conversion helpers for
//! `f32` and `f64`.
//!
//! A specific focus is placed on validating NaN-boxing, a RISC-V requirement where
//! single-precision values are stored in 64-bit registers with the upper bits set to all
//! ones, and a broken box reads back as the canonical quiet NaN.

use proptest::prelude::*;
use rvsim_state::core::arch::FloatingPointRegisterFile;
use rvsim_state::core::arch::fpr::{nan_box, nan_unbox};

/// Ensures that all floating-point registers are initialized to zero upon creation.
#[test]
fn fpr_all_registers_initially_zero() {
    let fpr = FloatingPointRegisterFile::new();
    for i in 0..32 {
        assert_eq!(fpr.get_value_long(i), Some(0), "f{i} should be 0 initially");
    }
    assert_eq!(fpr.get_value_long(32), None);
}

/// Confirms that a single-precision write sets the upper 32 bits.
#[test]
fn fpr_single_write_is_boxed() {
    let fpr = FloatingPointRegisterFile::new();
    let _ = fpr.set_register_to_float(1, 1.5);
    assert_eq!(fpr.get_value_long(1), Some(0xFFFF_FFFF_3FC0_0000));
    assert_eq!(fpr.get_float_from_register(1), Some(1.5));
}

/// A double written into the register is not a valid single and reads as the canonical NaN.
#[test]
fn fpr_unboxed_value_reads_canonical_nan() {
    let fpr = FloatingPointRegisterFile::new();
    let _ = fpr.set_register_to_double(2, 1.0);
    assert_eq!(fpr.get_value(2), Some(0x7FC0_0000));
    assert_eq!(fpr.get_double_from_register(2), Some(1.0));
    assert!(fpr.get_float_from_register(2).is_some_and(f32::is_nan));
}

/// Verifies lookup by ABI name and by `f` + number.
#[test]
fn fpr_names_resolve() {
    let fpr = FloatingPointRegisterFile::new();
    let _ = fpr.update_register_by_name("fa0", 0x4049_0FDB);
    assert_eq!(fpr.get_register_number("fa0"), Some(10));
    assert_eq!(fpr.get_value_by_name("f10"), Some(0x4049_0FDB));
    assert_eq!(fpr.get_value_long_by_name("fa0"), Some(nan_box(0x4049_0FDB)));
    assert_eq!(fpr.get_register_number("f32"), None);
}

/// Special IEEE 754 values survive a boxed round trip unchanged.
#[test]
fn fpr_special_singles_preserved() {
    let fpr = FloatingPointRegisterFile::new();
    for (i, value) in [f32::INFINITY, f32::NEG_INFINITY, -0.0, f32::MIN_POSITIVE / 2.0]
        .into_iter()
        .enumerate()
    {
        let number = i as i32;
        let _ = fpr.set_register_to_float(number, value);
        assert_eq!(
            fpr.get_float_from_register(number).map(f32::to_bits),
            Some(value.to_bits())
        );
    }
}

/// Resetting the file clears every register.
#[test]
fn fpr_reset_clears_registers() {
    let fpr = FloatingPointRegisterFile::new();
    let _ = fpr.set_register_to_double(31, 2.5);
    fpr.reset_registers();
    assert_eq!(fpr.get_value_long(31), Some(0));
}

proptest! {
    #[test]
    fn boxing_round_trips_every_single(bits in any::<u32>()) {
        prop_assert_eq!(nan_unbox(nan_box(bits)), bits);
    }

    #[test]
    fn broken_box_reads_canonical_nan(high in 0u32..u32::MAX, low in any::<u32>()) {
        let value = (u64::from(high) << 32) | u64::from(low);
        prop_assert_eq!(nan_unbox(value), 0x7FC0_0000);
    }
}
