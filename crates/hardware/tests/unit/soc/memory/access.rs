//! # Memory Access Tests
//!
//! Loads and stores of every width in the data, stack and MMIO segments: round trips,
//! little-endian composition, lazy allocation, alignment and range faults.

use std::sync::Arc;

use mockall::predicate::eq;
use proptest::prelude::*;
use rstest::rstest;
use rvsim_state::Memory;
use rvsim_state::common::AddressError;
use rvsim_state::core::backstep::RestoreRecord;

use crate::common::harness::init_tracing;
use crate::common::mocks::backstep::MockBackstepper;

const DATA: u32 = 0x1001_0000;
const STACK: u32 = 0x7FFF_EFFC;
const MMIO: u32 = 0xFFFF_0000;

#[test]
fn bytes_compose_little_endian_word() {
    let memory = Memory::default();
    for (offset, byte) in [0xAB, 0xCD, 0xEF, 0x01].into_iter().enumerate() {
        let _ = memory.set_byte(DATA + offset as u32, byte);
    }
    assert_eq!(memory.get_word(DATA), Ok(0x01EF_CDAB));
    assert_eq!(memory.get_half(DATA + 2), Ok(0x01EF));
    assert_eq!(memory.get_byte(DATA + 1), Ok(0xCD));
}

#[test]
fn unwritten_memory_reads_zero_and_null() {
    let memory = Memory::default();
    for address in [DATA, STACK, MMIO] {
        assert_eq!(memory.get_word(address), Ok(0));
        assert_eq!(memory.get_raw_word_or_null(address), Ok(None));
        assert_eq!(memory.get_raw_word(address), Ok(0));
    }
    let _ = memory.set_byte(DATA, 0);
    assert_eq!(memory.get_raw_word_or_null(DATA), Ok(Some(0)));
}

#[test]
fn stores_return_previous_contents() {
    let memory = Memory::default();
    assert_eq!(memory.set_word(DATA, 0x1122_3344), Ok(0));
    assert_eq!(memory.set_half(DATA + 2, 0xAAAA), Ok(0x1122));
    assert_eq!(memory.set_byte(DATA, 0xFF), Ok(0x44));
    assert_eq!(memory.set_word(DATA, 0), Ok(0xAAAA_33FF));
}

#[test]
fn values_are_truncated_to_length() {
    let memory = Memory::default();
    let _ = memory.set(DATA, 0xDEAD_BEEF, 2);
    assert_eq!(memory.get_word(DATA), Ok(0xBEEF));
    let _ = memory.set_byte(DATA + 4, 0x1FF);
    assert_eq!(memory.get_word(DATA + 4), Ok(0xFF));
}

#[test]
fn unaligned_generic_access_spans_words() {
    let memory = Memory::default();
    let _ = memory.set(DATA + 2, 0x4433_2211, 4);
    assert_eq!(memory.get_word(DATA), Ok(0x2211_0000));
    assert_eq!(memory.get_word(DATA + 4), Ok(0x0000_4433));
    assert_eq!(memory.get(DATA + 2, 4), Ok(0x4433_2211));
    assert_eq!(memory.get_no_notify(DATA + 1, 2), Ok(0x1100));
}

#[test]
fn double_words_are_two_little_endian_words() {
    let memory = Memory::default();
    assert_eq!(memory.set_double_word(DATA, 0x0123_4567_89AB_CDEF), Ok(0));
    assert_eq!(memory.get_word(DATA), Ok(0x89AB_CDEF));
    assert_eq!(memory.get_word(DATA + 4), Ok(0x0123_4567));
    assert_eq!(memory.get_double_word(DATA), Ok(0x0123_4567_89AB_CDEF));
    assert_eq!(
        memory.get_double_word(DATA + 2),
        Err(AddressError::LoadMisaligned(DATA + 2))
    );
}

#[test]
fn double_word_store_past_segment_end_writes_nothing() {
    let memory = Memory::default();
    let mut backstepper = MockBackstepper::new();
    let _ = backstepper.expect_record().times(0);
    memory.set_backstepper(Some(Arc::new(backstepper)));
    let last = memory.data_segment_limit_address() - 3;

    assert_eq!(
        memory.set_double_word(last, 0x1111_1111_2222_2222),
        Err(AddressError::StoreOutOfRange(last + 4))
    );
    assert_eq!(memory.get_raw_word_or_null(last), Ok(None));
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn unaligned_word_access_faults(#[case] offset: u32) {
    let memory = Memory::default();
    let address = DATA + offset;
    assert_eq!(memory.set_word(address, 1), Err(AddressError::StoreMisaligned(address)));
    assert_eq!(memory.get_word(address), Err(AddressError::LoadMisaligned(address)));
    assert_eq!(memory.set_raw_word(address, 1), Err(AddressError::StoreMisaligned(address)));
    assert_eq!(memory.get_raw_word(address), Err(AddressError::LoadMisaligned(address)));
}

#[test]
fn odd_half_access_faults() {
    let memory = Memory::default();
    assert_eq!(memory.set_half(DATA + 1, 1), Err(AddressError::StoreMisaligned(DATA + 1)));
    assert_eq!(memory.get_half(DATA + 3), Err(AddressError::LoadMisaligned(DATA + 3)));
}

#[rstest]
#[case(0)]
#[case(3)]
#[case(8)]
fn invalid_lengths_are_rejected(#[case] length: u32) {
    let memory = Memory::default();
    assert_eq!(memory.set(DATA, 0, length), Err(AddressError::StoreMisaligned(DATA)));
    assert_eq!(memory.get(DATA, length), Err(AddressError::LoadMisaligned(DATA)));
}

#[rstest]
#[case::below_text(0x0000_1000)]
#[case::between_heap_and_stack(0x5000_0000)]
#[case::kernel_gap(0x9000_0000)]
fn addresses_outside_every_segment_fault(#[case] address: u32) {
    init_tracing();
    let memory = Memory::default();
    assert_eq!(memory.set_word(address, 1), Err(AddressError::StoreOutOfRange(address)));
    assert_eq!(memory.get_word(address), Err(AddressError::LoadOutOfRange(address)));
    assert_eq!(memory.get_raw_word_or_null(address), Err(AddressError::LoadOutOfRange(address)));
}

#[test]
fn segment_predicates_match_default_layout() {
    let memory = Memory::default();
    assert!(memory.in_data_segment(DATA));
    assert!(memory.in_stack_segment(STACK));
    assert!(memory.in_memory_map_segment(MMIO));
    assert!(memory.in_text_segment(0x0040_0000));
    assert!(!memory.in_data_segment(STACK));
    assert_eq!(memory.memory_map_limit_address(), 0xFFFF_FFFF);
    assert_eq!(memory.stack_base_address(), STACK);
    assert_eq!(memory.data_base_address(), DATA);
}

#[test]
fn first_null_stops_at_unwritten_word() {
    let memory = Memory::default();
    for i in 0..3 {
        let _ = memory.set_word(DATA + 4 * i, i + 1);
    }
    assert_eq!(memory.get_address_of_first_null(DATA, DATA + 64), Ok(DATA + 12));
    assert_eq!(memory.get_address_of_first_null(DATA, DATA + 8), Ok(DATA + 8));
}

#[test]
fn public_setters_record_previous_values() {
    let memory = Memory::default();
    let _ = memory.set_word(DATA, 0xCAFE_F00D);

    let mut backstepper = MockBackstepper::new();
    let _ = backstepper
        .expect_record()
        .with(eq(RestoreRecord::MemoryWord {
            address: DATA,
            value: 0xCAFE_F00D,
        }))
        .times(1)
        .return_const(());
    let _ = backstepper
        .expect_record()
        .with(eq(RestoreRecord::MemoryByte {
            address: DATA + 8,
            value: 0,
        }))
        .times(1)
        .return_const(());
    memory.set_backstepper(Some(Arc::new(backstepper)));

    let _ = memory.set_word(DATA, 1);
    let _ = memory.set_byte(DATA + 8, 2);
    let _ = memory.set(DATA + 12, 3, 4);
    let _ = memory.set_word(DATA + 1, 4);
}

proptest! {
    #[test]
    fn word_round_trips_in_data(index in 0u32..0x0010_0000, value in any::<u32>()) {
        let memory = Memory::default();
        let address = 0x1000_0000 + 4 * index;
        prop_assert_eq!(memory.set_word(address, value), Ok(0));
        prop_assert_eq!(memory.get_word(address), Ok(value));
    }

    #[test]
    fn word_round_trips_in_stack(index in 0u32..0x0010_0000, value in any::<u32>()) {
        let memory = Memory::default();
        let address = STACK - 4 * index;
        prop_assert_eq!(memory.set_word(address, value), Ok(0));
        prop_assert_eq!(memory.get_word(address), Ok(value));
    }

    #[test]
    fn word_round_trips_in_mmio(index in 0u32..0x4000, value in any::<u32>()) {
        let memory = Memory::default();
        let address = MMIO + 4 * index;
        prop_assert_eq!(memory.set_word(address, value), Ok(0));
        prop_assert_eq!(memory.get_word(address), Ok(value));
    }

    #[test]
    fn neighbouring_words_are_untouched(index in 1u32..0x1000, value in any::<u32>()) {
        let memory = Memory::default();
        let address = DATA + 4 * index;
        let _ = memory.set_word(address, value);
        prop_assert_eq!(memory.get_word(address - 4), Ok(0));
        prop_assert_eq!(memory.get_word(address + 4), Ok(0));
    }
}
