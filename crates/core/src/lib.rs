//! # rf-core
//!
//! Client-side engine of reportflow.
//!
//! This crate provides:
//! - Configuration loading from the `.reportflow/` directory
//! - The Remote Executor contract with HTTP and mock implementations
//! - The Execution Tracker that drives one pipeline run and derives its
//!   progress
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and overrides
//! - [`executor`]: Remote Executor trait and clients
//! - [`tracker`]: Execution session state machine and controller
//! - [`inputs`]: Local file assignments for upload slots

pub mod config;
pub mod executor;
pub mod inputs;
pub mod tracker;
