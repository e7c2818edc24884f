//! Execution session models.
//!
//! These types describe what a tracker session looks like from the outside:
//! its lifecycle status, the derived per-step display state, the typed
//! errors it can surface, and the read-only snapshot handed to renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use ts_rs::TS;
use uuid::Uuid;

use crate::pipeline_models::{FileSpec, Step};

/// Lifecycle status of a tracker session.
///
/// Normal flow:
/// Loading -> Idle -> Executing -> Idle ... -> Success
///
/// Special states:
/// - RequestingFiles: the pipeline opens with a file-request step and the
///   user must supply files before anything can run
/// - Error: the last remote call failed; the user may retry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Definition loaded and waiting for the user to advance or run.
    Idle,

    /// Definition is being fetched.
    Loading,

    /// Waiting for the user to attach files to every required slot.
    RequestingFiles,

    /// A remote call chain is in flight.
    Executing,

    /// Every step has completed.
    Success,

    /// The last remote call failed.
    Error,
}

impl SessionStatus {
    /// True while a remote call for this session is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionStatus::Loading | SessionStatus::Executing)
    }

    /// True when the advance/run commands are accepted.
    pub fn accepts_execution(self) -> bool {
        matches!(self, SessionStatus::Idle | SessionStatus::RequestingFiles)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Loading => "loading",
            SessionStatus::RequestingFiles => "requesting_files",
            SessionStatus::Executing => "executing",
            SessionStatus::Success => "success",
            SessionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual classification of one step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Errored,
    Pending,
}

/// Outcome of a successful full run (or final single step).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct ExecutionResult {
    /// Names of the artifacts the executor produced, e.g. `report.pdf`.
    #[serde(default)]
    pub artifacts: Vec<String>,
}

/// Errors a tracker session can surface.
///
/// Validation variants never involve the network and leave the session
/// untouched; the host should ask the user to fix their input. Remote
/// variants move the session to [`SessionStatus::Error`] and can be retried.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackerError {
    /// Required upload slots have no files attached.
    MissingFiles { labels: Vec<String> },

    /// More than one file was attached to a single-file slot.
    TooManyFiles { label: String, count: usize },

    /// The pipeline definition could not be retrieved.
    Fetch { message: String },

    /// Uploading the files for one slot failed.
    Upload { spec_id: String, message: String },

    /// A step or full-run call failed.
    Execution { message: String },
}

impl TrackerError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TrackerError::MissingFiles { .. } | TrackerError::TooManyFiles { .. }
        )
    }

    /// Remote failures may be retried; validation failures need new input.
    pub fn is_retryable(&self) -> bool {
        !self.is_validation()
    }
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::MissingFiles { labels } => {
                write!(f, "Please upload the required files: {}", labels.join(", "))
            }
            TrackerError::TooManyFiles { label, count } => {
                write!(f, "{label} accepts a single file, got {count}")
            }
            TrackerError::Fetch { message } => f.write_str(message),
            TrackerError::Upload { spec_id, message } => {
                write!(f, "Upload for {spec_id} failed: {message}")
            }
            TrackerError::Execution { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for TrackerError {}

/// What a tracker command did.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The command was accepted and its remote call chain started.
    Started,

    /// The command is not valid in the current state and did nothing.
    Ignored,

    /// The command failed validation; no remote call was made.
    Rejected(TrackerError),
}

impl CommandOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, CommandOutcome::Started)
    }
}

/// Read-only view of a tracker session for rendering.
///
/// `display_index`, `progress_percent` and `step_states` are derived from
/// the other fields at the time the snapshot is taken.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct TrackerSnapshot {
    #[ts(type = "string")]
    pub session_id: Uuid,

    pub pipeline_id: String,

    pub status: SessionStatus,

    pub steps: Vec<Step>,

    /// Index of the step currently executing or next to execute.
    pub current_step_index: usize,

    /// Index to highlight; never past the last step.
    pub display_index: usize,

    /// Position of `display_index` along the step list, 0 to 100.
    pub progress_percent: f64,

    pub step_states: Vec<StepState>,

    /// Upload slots requested by the leading file-request step.
    pub file_specs: Vec<FileSpec>,

    #[ts(type = "Record<string, Array<string>>")]
    pub collected_files: BTreeMap<String, Vec<PathBuf>>,

    pub error: Option<TrackerError>,

    pub result: Option<ExecutionResult>,

    pub opened_at: DateTime<Utc>,
}

impl TrackerSnapshot {
    /// The step that `display_index` points at.
    pub fn display_step(&self) -> Option<&Step> {
        self.steps.get(self.display_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_message_lists_labels() {
        let err = TrackerError::MissingFiles {
            labels: vec!["A".to_string(), "B".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains('A'));
        assert!(message.contains('B'));
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_remote_errors_are_retryable() {
        let err = TrackerError::Execution {
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "boom");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_status_helpers() {
        assert!(SessionStatus::Executing.is_busy());
        assert!(SessionStatus::Loading.is_busy());
        assert!(!SessionStatus::Idle.is_busy());
        assert!(SessionStatus::RequestingFiles.accepts_execution());
        assert!(!SessionStatus::Error.accepts_execution());
        assert_eq!(SessionStatus::RequestingFiles.to_string(), "requesting_files");
    }
}
