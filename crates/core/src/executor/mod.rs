//! Clients for the Remote Executor.
//!
//! The executor owns pipeline definitions and runs the steps; reportflow
//! only issues commands and reads replies. [`RemoteExecutor`] is the seam:
//! the tracker talks to it, [`HttpExecutor`] speaks the HTTP/JSON API and
//! [`MockExecutor`] is a scriptable in-process stand-in.

pub mod base;
pub mod http;
pub mod mock;

pub use base::{ExecutorError, ExecutorResult, RemoteExecutor, StepAdvance};
pub use http::HttpExecutor;
pub use mock::{MockCall, MockExecutor};
