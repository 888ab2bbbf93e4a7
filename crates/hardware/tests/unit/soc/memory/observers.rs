//! # Memory Observer Tests
//!
//! Observers are scoped to an address range whose last word is included, receive exactly
//! one notice per access, and are withdrawn through their handle.

use pretty_assertions::assert_eq;
use rvsim_state::Memory;
use rvsim_state::common::{AccessType, AddressError, MemoryAccessNotice, ObserverRangeError};

use crate::common::harness::Recorder;

const DATA: u32 = 0x1001_0000;

fn observed(start: u32, end: u32) -> (Memory, Recorder<MemoryAccessNotice>) {
    let memory = Memory::default();
    let recorder = Recorder::new();
    let _ = memory
        .add_observer_range(recorder.memory_observer(), start, end)
        .unwrap_or_else(|e| panic!("registration rejected: {e}"));
    (memory, recorder)
}

#[test]
fn single_word_observer_sees_exactly_one_notice() {
    let (memory, recorder) = observed(DATA, DATA);
    let _ = memory.set_word(DATA, 0x1234_5678);
    assert_eq!(
        recorder.items(),
        vec![MemoryAccessNotice::new(AccessType::Write, DATA, 4, 0x1234_5678)]
    );
}

#[test]
fn accesses_outside_the_range_are_not_reported() {
    let (memory, recorder) = observed(DATA, DATA);
    let _ = memory.set_word(DATA + 4, 1);
    let _ = memory.set_word(DATA - 4, 1);
    let _ = memory.get_word(DATA + 4);
    assert!(recorder.is_empty());
}

#[test]
fn last_word_of_range_is_included() {
    let (memory, recorder) = observed(DATA, DATA + 8);
    let _ = memory.set_byte(DATA + 11, 0x7F);
    let _ = memory.get_half(DATA + 10);
    let _ = memory.set_byte(DATA + 12, 0x7F);
    assert_eq!(
        recorder.items(),
        vec![
            MemoryAccessNotice::new(AccessType::Write, DATA + 11, 1, 0x7F),
            MemoryAccessNotice::new(AccessType::Read, DATA + 10, 2, 0x7F00),
        ]
    );
}

#[test]
fn silent_reads_are_not_reported() {
    let (memory, recorder) = observed(DATA, DATA);
    let _ = memory.get_word_no_notify(DATA);
    let _ = memory.get_no_notify(DATA, 1);
    let _ = memory.get_raw_word(DATA);
    assert!(recorder.is_empty());
    let _ = memory.get_byte(DATA);
    assert_eq!(recorder.len(), 1);
}

#[test]
fn double_word_store_reports_each_half() {
    let (memory, recorder) = observed(DATA, DATA + 4);
    let _ = memory.set_double_word(DATA, 0x0000_0002_0000_0001);
    let addresses: Vec<u32> = recorder.items().iter().map(|n| n.address).collect();
    assert_eq!(addresses, vec![DATA, DATA + 4]);
}

#[test]
fn invalid_ranges_are_rejected() {
    let memory = Memory::default();
    let recorder = Recorder::<MemoryAccessNotice>::new();
    assert_eq!(
        memory.add_observer_range(recorder.memory_observer(), DATA + 4, DATA),
        Err(ObserverRangeError::Inverted {
            start: DATA + 4,
            end: DATA,
        })
    );
    assert_eq!(
        memory.add_observer_range(recorder.memory_observer(), 0x7FFF_F000, 0x8000_0000),
        Err(ObserverRangeError::StraddlesSignBoundary {
            start: 0x7FFF_F000,
            end: 0x8000_0000,
        })
    );
    assert_eq!(memory.count_observers(), 0);
}

#[test]
fn whole_space_observer_sees_both_halves_under_one_handle() {
    let memory = Memory::default();
    let recorder = Recorder::<MemoryAccessNotice>::new();
    let id = memory.add_observer(recorder.memory_observer());
    assert_eq!(memory.count_observers(), 1);

    let _ = memory.set_word(DATA, 1);
    let _ = memory.set_word(0xFFFF_0000, 2);
    assert_eq!(recorder.len(), 2);

    assert!(memory.delete_observer(id));
    assert_eq!(memory.count_observers(), 0);
    let _ = memory.set_word(DATA, 3);
    assert_eq!(recorder.len(), 2);
}

#[test]
fn delete_observers_removes_everything() {
    let memory = Memory::default();
    let recorder = Recorder::<MemoryAccessNotice>::new();
    let _ = memory.add_observer_at(recorder.memory_observer(), DATA);
    let _ = memory.add_observer(recorder.memory_observer());
    assert_eq!(memory.count_observers(), 2);
    memory.delete_observers();
    assert_eq!(memory.count_observers(), 0);
}

#[test]
fn failed_access_is_not_reported() {
    let (memory, recorder) = observed(DATA, DATA + 4);
    let _ = memory.set_word(DATA + 2, 1);
    let _ = memory.get_word(DATA + 1);
    assert!(recorder.is_empty());
}

#[test]
fn faulting_double_word_load_reports_nothing() {
    let memory = Memory::default();
    let last = memory.data_segment_limit_address() - 3;
    let recorder = Recorder::<MemoryAccessNotice>::new();
    let _ = memory
        .add_observer_at(recorder.memory_observer(), last)
        .unwrap_or_else(|e| panic!("registration rejected: {e}"));

    assert_eq!(
        memory.get_double_word(last),
        Err(AddressError::LoadOutOfRange(last + 4))
    );
    assert!(recorder.is_empty());
}
