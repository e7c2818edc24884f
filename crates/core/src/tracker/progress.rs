//! Derived progress values.
//!
//! Nothing here is stored on the session; every value is recomputed from
//! `(status, current_step_index, step count)` when a snapshot is taken.

use rf_protocol::session_models::{SessionStatus, StepState};

/// Index of the step to highlight.
///
/// Never past the last step, and pinned to the last step on success.
pub fn display_index(status: SessionStatus, current: usize, len: usize) -> usize {
    let last = len.saturating_sub(1);
    if status == SessionStatus::Success {
        last
    } else {
        current.min(last)
    }
}

/// Position of `display_index` along the step list, from 0 to 100.
pub fn progress_percent(display_index: usize, len: usize) -> f64 {
    if len <= 1 {
        return 0.0;
    }
    100.0 * display_index as f64 / (len - 1) as f64
}

pub fn classify_step(index: usize, status: SessionStatus, current: usize) -> StepState {
    if status == SessionStatus::Error && index == current {
        StepState::Errored
    } else if index < current {
        StepState::Completed
    } else if index == current && status != SessionStatus::Success {
        StepState::Current
    } else {
        StepState::Pending
    }
}

pub fn step_states(status: SessionStatus, current: usize, len: usize) -> Vec<StepState> {
    (0..len)
        .map(|index| classify_step(index, status, current))
        .collect()
}
