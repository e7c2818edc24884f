//! # rf-protocol
//!
//! Protocol definitions and data models for reportflow.
//!
//! This crate defines all shared data structures used for:
//! - Pipeline definitions served by the Remote Executor
//! - Decoding the executor's JSON replies
//! - Tracker session state and snapshots
//! - Configuration file parsing (`.reportflow/config.toml`)
//! - Communication between a host UI and the tracker
//!
//! ## Modules
//!
//! - [`config_models`]: Global configuration from config.toml
//! - [`executor_models`]: Wire replies of the executor's HTTP API
//! - [`pipeline_models`]: Pipeline definitions, steps and file specs
//! - [`session_models`]: Session status, snapshots and tracker errors
//! - [`ipc`]: Operations and Events between host and tracker
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: host-facing types derive `TS`
//! - Independent compilation: No dependencies on other reportflow crates

pub mod config_models;
pub mod executor_models;
pub mod ipc;
pub mod pipeline_models;
pub mod session_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use executor_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use session_models::*;
