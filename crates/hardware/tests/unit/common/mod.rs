//! # Common Module Tests

/// Address error causes and messages.
pub mod error;
