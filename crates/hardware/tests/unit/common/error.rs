//! # Error Tests
//!
//! Address errors carry the faulting address and map to RISC-V exception causes.

use rstest::rstest;
use rvsim_state::common::constants::{
    LOAD_ACCESS_FAULT, LOAD_ADDRESS_MISALIGNED, STORE_ACCESS_FAULT, STORE_ADDRESS_MISALIGNED,
};
use rvsim_state::common::{AddressError, HeapError, ReservationError};

#[rstest]
#[case::load_misaligned(AddressError::LoadMisaligned(0x1001), LOAD_ADDRESS_MISALIGNED)]
#[case::store_misaligned(AddressError::StoreMisaligned(0x1002), STORE_ADDRESS_MISALIGNED)]
#[case::load_out_of_range(AddressError::LoadOutOfRange(0x0), LOAD_ACCESS_FAULT)]
#[case::store_out_of_range(AddressError::StoreOutOfRange(0x0), STORE_ACCESS_FAULT)]
#[case::text_read(AddressError::TextReadForbidden(0x0040_0000), LOAD_ACCESS_FAULT)]
#[case::text_write(AddressError::TextWriteForbidden(0x0040_0000), STORE_ACCESS_FAULT)]
fn address_error_maps_to_cause(#[case] error: AddressError, #[case] cause: u32) {
    assert_eq!(error.cause(), cause);
}

#[test]
fn address_error_reports_address_in_message() {
    let error = AddressError::StoreOutOfRange(0xDEAD_BEEC);
    assert_eq!(error.address(), 0xDEAD_BEEC);
    assert!(error.to_string().contains("0xdeadbeec"));
    assert!(!error.is_misaligned());
    assert!(AddressError::LoadMisaligned(1).is_misaligned());
}

#[test]
fn heap_error_messages_name_the_request() {
    assert!(HeapError::NegativeSize(-4).to_string().contains("-4"));
    assert!(HeapError::Exhausted(4096).to_string().contains("4096"));
}

#[test]
fn reservation_error_wraps_address_error() {
    let error: ReservationError = AddressError::LoadMisaligned(0x1002).into();
    assert_eq!(error.to_string(), AddressError::LoadMisaligned(0x1002).to_string());
}
