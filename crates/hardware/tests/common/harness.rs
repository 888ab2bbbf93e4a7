//! # Test Harness
//!
//! Tracing initialisation and observers that record every notice they receive, so tests
//! can assert on exactly what was delivered.

use std::sync::{Arc, Mutex, PoisonError};

use rvsim_state::common::{
    MemoryAccessNotice, MemoryObserver, RegisterAccessNotice, RegisterObserver,
};
use rvsim_state::core::units::lsu::ReservationObserver;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; output is captured by the test runner.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared list of received items.
#[derive(Debug)]
pub struct Recorder<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> Recorder<T> {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one item.
    pub fn push(&self, item: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    /// Returns a copy of everything received so far.
    pub fn items(&self) -> Vec<T> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of items received.
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Recorder<MemoryAccessNotice> {
    /// Memory observer appending each notice to this recorder.
    pub fn memory_observer(&self) -> Arc<dyn MemoryObserver> {
        let recorder = self.clone();
        Arc::new(move |notice: &MemoryAccessNotice| recorder.push(*notice))
    }
}

impl Recorder<RegisterAccessNotice> {
    /// Register observer appending each notice to this recorder.
    pub fn register_observer(&self) -> Arc<dyn RegisterObserver> {
        let recorder = self.clone();
        Arc::new(move |notice: &RegisterAccessNotice| recorder.push(notice.clone()))
    }
}

impl Recorder<Vec<Vec<String>>> {
    /// Reservation observer appending each table snapshot to this recorder.
    pub fn reservation_observer(&self) -> Arc<dyn ReservationObserver> {
        let recorder = self.clone();
        Arc::new(move |table: &[Vec<String>]| recorder.push(table.to_vec()))
    }
}
