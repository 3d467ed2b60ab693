//! # Fleet Test Utilities
//!
//! Shared testing utilities for the fleet crates:
//! - Determinism test harness
//! - Stock unit templates and world builders
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
