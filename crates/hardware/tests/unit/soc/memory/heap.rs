//! # Heap Tests
//!
//! The heap is a word-rounding bump allocator inside the data segment.

use std::sync::Arc;

use rstest::rstest;
use rvsim_state::Memory;
use rvsim_state::common::HeapError;
use rvsim_state::soc::memory::configuration::MemoryConfiguration;

#[test]
fn allocations_are_word_rounded_and_monotonic() {
    let memory = Memory::default();
    let base = memory.heap_base_address();
    assert_eq!(base, 0x1004_0000);
    assert_eq!(memory.allocate_bytes_from_heap(5), Ok(base));
    assert_eq!(memory.allocate_bytes_from_heap(4), Ok(base + 8));
    assert_eq!(memory.allocate_bytes_from_heap(0), Ok(base + 12));
    assert_eq!(memory.heap_address(), base + 12);
}

#[rstest]
#[case(-1)]
#[case(i32::MIN)]
fn negative_requests_are_rejected(#[case] size: i32) {
    let memory = Memory::default();
    assert_eq!(memory.allocate_bytes_from_heap(size), Err(HeapError::NegativeSize(size)));
    assert_eq!(memory.heap_address(), memory.heap_base_address());
}

#[test]
fn exhausting_the_data_segment_fails_without_moving_cursor() {
    let memory = Memory::new(Arc::new(MemoryConfiguration::compact_text_at_zero()));
    let base = memory.heap_base_address();
    assert_eq!(base, 0x2000);
    assert_eq!(memory.allocate_bytes_from_heap(0x1000), Ok(base));
    assert_eq!(memory.allocate_bytes_from_heap(1), Err(HeapError::Exhausted(1)));
    assert_eq!(memory.heap_address(), 0x3000);
}

#[test]
fn clear_resets_the_heap() {
    let memory = Memory::default();
    let _ = memory.allocate_bytes_from_heap(64);
    memory.clear();
    assert_eq!(memory.heap_address(), memory.heap_base_address());
}
