//! Test utilities for the discussion core
//!
//! Fixtures that wire a manager to an in-memory store and a fixed clock,
//! plus assertions for the error classes callers care about.

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
