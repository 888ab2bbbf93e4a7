//! # Text Segment Tests
//!
//! Statements are installed by the assembler and always readable through the statement
//! and raw-word paths. Ordinary data access needs self-modifying code, in which case
//! writes merge into the old encoding and are re-decoded.

use std::sync::Arc;
use std::thread;

use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use rvsim_state::Memory;
use rvsim_state::common::AddressError;
use rvsim_state::isa::ProgramStatement;

use crate::common::mocks::decoder::MockDecoder;

const TEXT: u32 = 0x0040_0000;

fn with_program(words: &[u32]) -> Memory {
    let memory = Memory::default();
    for (i, &binary) in words.iter().enumerate() {
        let address = TEXT + 4 * i as u32;
        let installed = memory.set_statement(address, ProgramStatement::from_binary(binary, address));
        assert_eq!(installed, Ok(None));
    }
    memory
}

#[test]
fn statements_are_returned_as_installed() {
    let memory = with_program(&[0x0000_0013, 0x0010_0093]);
    let statement = memory.get_statement(TEXT + 4);
    assert_eq!(
        statement.map(|s| s.map(|s| s.binary())),
        Ok(Some(0x0010_0093))
    );
    assert_eq!(memory.get_statement_no_notify(TEXT + 8), Ok(None));
    assert_eq!(memory.get_raw_word(TEXT), Ok(0x13));
    assert_eq!(memory.get_raw_word_or_null(TEXT + 8), Ok(None));
}

#[test]
fn statements_outside_text_are_rejected() {
    let memory = Memory::default();
    assert_eq!(
        memory.set_statement(0x1001_0000, ProgramStatement::from_binary(0, 0x1001_0000)),
        Err(AddressError::StoreOutOfRange(0x1001_0000))
    );
    assert_eq!(
        memory.get_statement(0x1001_0000),
        Err(AddressError::LoadOutOfRange(0x1001_0000))
    );
    assert_eq!(
        memory.get_statement(TEXT + 2),
        Err(AddressError::LoadMisaligned(TEXT + 2))
    );
}

#[test]
fn data_access_to_text_needs_self_modifying_code() {
    let memory = with_program(&[0x0000_0013]);
    assert_eq!(memory.set_word(TEXT, 0), Err(AddressError::TextWriteForbidden(TEXT)));
    assert_eq!(memory.set_byte(TEXT + 1, 0), Err(AddressError::TextWriteForbidden(TEXT + 1)));
    assert_eq!(memory.get_word(TEXT), Err(AddressError::TextReadForbidden(TEXT)));
    assert_eq!(memory.get_raw_word(TEXT), Ok(0x13));
}

#[test]
fn self_modifying_byte_write_merges_and_redecodes() {
    let memory = with_program(&[0x1122_3344]);
    memory.set_self_modifying_code(true);

    let mut decoder = MockDecoder::new();
    let _ = decoder
        .expect_decode()
        .with(eq(0x11AA_3344), eq(TEXT))
        .times(1)
        .returning(|binary, address| {
            ProgramStatement::with_source(binary, address, "patched", 1)
        });
    memory.set_decoder(Arc::new(decoder));

    assert_eq!(memory.set_byte(TEXT + 2, 0xAA), Ok(0x22));
    assert_eq!(memory.get_word(TEXT), Ok(0x11AA_3344));
    assert_eq!(memory.get_half(TEXT + 2), Ok(0x11AA));

    let statement = memory.get_statement_no_notify(TEXT);
    assert_eq!(
        statement.map(|s| s.and_then(|s| s.source().map(str::to_owned))),
        Ok(Some("patched".to_owned()))
    );
}

#[test]
fn self_modifying_write_to_empty_slot_starts_from_zero() {
    let memory = Memory::default();
    memory.set_self_modifying_code(true);
    assert_eq!(memory.set_half(TEXT + 6, 0xBEEF), Ok(0));
    assert_eq!(memory.get_raw_word(TEXT + 4), Ok(0xBEEF_0000));
}

#[test]
fn self_modifying_access_may_not_cross_word() {
    let memory = Memory::default();
    memory.set_self_modifying_code(true);
    assert_eq!(memory.set(TEXT + 3, 0xFFFF, 2), Err(AddressError::StoreMisaligned(TEXT + 3)));
    assert_eq!(memory.get(TEXT + 2, 4), Err(AddressError::LoadMisaligned(TEXT + 2)));
}

#[test]
fn raw_word_write_to_text_redecodes() {
    let memory = with_program(&[0x0000_0013]);
    memory.set_self_modifying_code(true);
    assert_eq!(memory.set_raw_word(TEXT, 0x0000_0073), Ok(0x13));
    assert_eq!(
        memory.get_statement(TEXT).map(|s| s.map(|s| s.binary())),
        Ok(Some(0x73))
    );
}

#[test]
fn concurrent_byte_writes_to_one_instruction_all_land() {
    let memory = with_program(&[0]);
    memory.set_self_modifying_code(true);

    thread::scope(|scope| {
        for lane in 0..4 {
            let memory = &memory;
            let _ = scope.spawn(move || {
                for value in 0..=0xFF {
                    let _ = memory.set_byte(TEXT + lane, value);
                }
            });
        }
    });

    assert_eq!(memory.get_raw_word(TEXT), Ok(0xFFFF_FFFF));
    assert_eq!(
        memory
            .get_statement_no_notify(TEXT)
            .map(|s| s.map(|s| s.address())),
        Ok(Some(TEXT))
    );
}
