//! Common test utilities and helpers for tracker integration tests.
//!
//! This module provides shared functionality across the integration tests:
//! - Test fixtures (pipeline definitions, mock-backed trackers)
//! - Waiting helpers for asynchronous state changes
//! - Event assertions

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
