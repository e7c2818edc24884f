//! Configuration loading and management.
//!
//! This module loads `.reportflow/config.toml` and layers environment and
//! command-line overrides on top of it.

pub mod error;
pub mod loader;
pub mod models;
