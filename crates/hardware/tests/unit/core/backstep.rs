//! # Restore Log Tests
//!
//! The bounded undo stack keeps the newest records and hands them back newest first.

use pretty_assertions::assert_eq;
use rvsim_state::core::backstep::{Backstepper, RestoreLog, RestoreRecord};

fn word(address: u32) -> RestoreRecord {
    RestoreRecord::MemoryWord { address, value: 0 }
}

#[test]
fn records_pop_newest_first() {
    let log = RestoreLog::new(8);
    log.record(word(0x10));
    log.record(RestoreRecord::ProgramCounter { value: 4 });
    assert_eq!(log.len(), 2);
    assert_eq!(log.pop(), Some(RestoreRecord::ProgramCounter { value: 4 }));
    assert_eq!(log.pop(), Some(word(0x10)));
    assert_eq!(log.pop(), None);
}

#[test]
fn full_log_discards_oldest() {
    let log = RestoreLog::new(3);
    for address in [0, 4, 8, 12] {
        log.record(word(address));
    }
    assert_eq!(log.snapshot(), vec![word(4), word(8), word(12)]);
}

#[test]
fn clear_empties_log() {
    let log = RestoreLog::new(4);
    log.record(word(0));
    log.clear();
    assert!(log.is_empty());
}
