//! # Mocks
//!
//! `mockall` doubles for the traits the state core accepts from its host.


/// Mock instruction decoder for self-modifying code.
pub mod decoder;
