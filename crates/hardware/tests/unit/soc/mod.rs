//! # System-on-Chip Tests
//!
//! Covers the simulated memory and the layout configurations it is built from.
