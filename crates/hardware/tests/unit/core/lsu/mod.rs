//! # Load/Store Unit Tests
