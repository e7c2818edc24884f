//! TUI widgets module.
//!
//! This module contains the two panels of the TUI: the workflow list and the
//! tracker for an open session.

pub mod tracker_view;
pub mod workflow_list;

pub use tracker_view::render_tracker;
pub use workflow_list::render_workflow_list;
