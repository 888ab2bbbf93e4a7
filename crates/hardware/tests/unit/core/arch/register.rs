//! # Register Tests
//!
//! Verifies the storage behaviours of a single register: plain, masked, read-only and
//! linked views, plus reset values and observer notification.

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rvsim_state::common::{AccessType, RegisterAccessNotice};
use rvsim_state::core::arch::Register;

use crate::common::harness::Recorder;

#[test]
fn set_value_returns_previous_value() {
    let register = Register::new("t0", 5, 7);
    assert_eq!(register.set_value(9), 7);
    assert_eq!(register.get_value(), 9);
}

#[test]
fn reset_restores_changed_reset_value() {
    let register = Register::new("sp", 2, 0x100);
    let _ = register.set_value(0x55);
    register.change_reset_value(0x200);
    assert_eq!(register.get_reset_value(), 0x200);
    register.reset_value();
    assert_eq!(register.get_value(), 0x200);
}

#[test]
fn read_only_ignores_ordinary_writes() {
    let register = Register::read_only("cycle", 0xC00, 0);
    let recorder = Recorder::<RegisterAccessNotice>::new();
    let _ = register.add_observer(recorder.register_observer());

    assert_eq!(register.set_value(42), 0);
    assert_eq!(register.get_value_no_notify(), 0);
    assert!(recorder.is_empty());

    assert_eq!(register.set_value_backdoor(42), 0);
    assert_eq!(register.get_value_no_notify(), 42);
}

#[test]
fn backdoor_ignores_mask() {
    let register = Register::masked("ustatus", 0, 0, !0x11);
    let _ = register.set_value_backdoor(0xFF);
    assert_eq!(register.get_value_no_notify(), 0xFF);
}

#[test]
fn linked_registers_share_base_storage() {
    let base = Arc::new(Register::new("fcsr", 3, 0));
    let low = Register::linked("fflags", 1, Arc::clone(&base), 0x1F);
    let high = Register::linked("frm", 2, Arc::clone(&base), 0xE0);

    let _ = high.set_value(0b101);
    let _ = low.set_value(0b10011);
    assert_eq!(high.get_value_no_notify(), 0b101);
    assert_eq!(low.get_value_no_notify(), 0b10011);
    assert_eq!(base.get_value_no_notify(), 0b1011_0011);
}

#[test]
fn linked_write_truncates_to_field_width() {
    let base = Arc::new(Register::new("fcsr", 3, 0));
    let frm = Register::linked("frm", 2, Arc::clone(&base), 0xE0);
    let _ = frm.set_value(0xFF);
    assert_eq!(frm.get_value_no_notify(), 0x7);
    assert_eq!(base.get_value_no_notify(), 0xE0);
}

#[test]
fn read_and_write_each_emit_one_notice() {
    let register = Register::new("a0", 10, 0);
    let recorder = Recorder::<RegisterAccessNotice>::new();
    let id = register.add_observer(recorder.register_observer());

    let _ = register.set_value(1);
    let _ = register.get_value();
    let _ = register.get_value_no_notify();
    let _ = register.set_value_backdoor(2);

    let notices = recorder.items();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].access_type, AccessType::Write);
    assert_eq!(notices[1].access_type, AccessType::Read);
    assert_eq!(&*notices[0].register_name, "a0");
    assert_eq!(notices[0].register_number, 10);

    assert!(register.delete_observer(id));
    assert!(!register.delete_observer(id));
    let _ = register.get_value();
    assert_eq!(recorder.len(), 2);
}

proptest! {
    #[test]
    fn masked_bits_survive_any_write(reset in any::<u64>(), mask in any::<u64>(), value in any::<u64>()) {
        let register = Register::masked("r", 0, reset, mask);
        let _ = register.set_value(value);
        let stored = register.get_value_no_notify();
        prop_assert_eq!(stored & mask, reset & mask);
        prop_assert_eq!(stored & !mask, value & !mask);
    }

    #[test]
    fn linked_value_round_trips(shift in 0u32..56, width in 1u32..8, value in any::<u64>(), other in any::<u64>()) {
        let mask = ((1u64 << width) - 1) << shift;
        let base = Arc::new(Register::new("base", 0, other));
        let view = Register::linked("view", 1, Arc::clone(&base), mask);
        let _ = view.set_value(value);
        prop_assert_eq!(view.get_value_no_notify(), value & (mask >> shift));
        prop_assert_eq!(base.get_value_no_notify() & !mask, other & !mask);
    }
}

#[test]
fn backdoor_writes_are_not_lost_to_linked_writers() {
    const ROUNDS: u64 = 20_000;

    let base = Arc::new(Register::read_only("cycle", 0xC00, 0));
    let low = Register::linked("cycle.lo", -2, Arc::clone(&base), 0xFFFF_FFFF);

    thread::scope(|scope| {
        let _ = scope.spawn(|| {
            for i in 0..ROUNDS {
                let _ = low.set_value(i);
            }
        });
        let _ = scope.spawn(|| {
            for i in 1..=ROUNDS {
                let _ = base.set_value_backdoor(i << 32);
            }
        });
    });

    assert_eq!(base.get_value_no_notify() >> 32, ROUNDS);
}
