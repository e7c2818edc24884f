//! Execution session state machine.
//!
//! An `ExecutionSession` is the local view of one remote pipeline run. It
//! performs no I/O: every method is a transition that the async tracker
//! applies under its lock, either in response to a command or when a remote
//! call settles.

use crate::executor::base::StepAdvance;
use crate::tracker::progress::{display_index, progress_percent, step_states};
use chrono::{DateTime, Utc};
use rf_protocol::pipeline_models::{FileSpec, PipelineDefinition, Step};
use rf_protocol::session_models::{
    CommandOutcome, ExecutionResult, SessionStatus, TrackerError, TrackerSnapshot,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// How much of the pipeline an execution command covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Only the next step.
    OneStep,
    /// Every remaining step.
    All,
}

/// The operation class a retry re-issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedOperation {
    Fetch,
    /// An upload, single-step or full-run call.
    Execute,
}

/// Remote work for one accepted execution command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub session_id: Uuid,
    pub pipeline_id: String,
    pub mode: RunMode,
    /// File sets to upload first, keyed by spec id. Empty when nothing is
    /// pending.
    pub uploads: Vec<(String, Vec<PathBuf>)>,
}

/// What `retry` asks the tracker to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    Fetch,
    Execute(ExecutionPlan),
}

#[derive(Debug, Clone)]
pub struct ExecutionSession {
    pub id: Uuid,
    pub pipeline_id: String,
    pub status: SessionStatus,
    pub steps: Vec<Step>,
    /// 0-based cursor; equals `steps.len()` only once everything completed.
    pub current_step_index: usize,
    pub file_specs: Vec<FileSpec>,
    pub collected_files: BTreeMap<String, Vec<PathBuf>>,
    /// True until the collected files have been uploaded once successfully.
    pub uploads_pending: bool,
    pub last_failure: Option<FailedOperation>,
    pub error: Option<TrackerError>,
    pub result: Option<ExecutionResult>,
    pub opened_at: DateTime<Utc>,
}

impl ExecutionSession {
    /// A session waiting for its definition.
    pub fn new(pipeline_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline_id: pipeline_id.into(),
            status: SessionStatus::Loading,
            steps: Vec::new(),
            current_step_index: 0,
            file_specs: Vec::new(),
            collected_files: BTreeMap::new(),
            uploads_pending: false,
            last_failure: None,
            error: None,
            result: None,
            opened_at: Utc::now(),
        }
    }

    /// The definition arrived.
    pub fn on_definition(&mut self, definition: PipelineDefinition) {
        let gated = definition.starts_with_file_request();
        let specs = definition.file_specs();
        self.steps = definition.steps;
        self.current_step_index = 0;
        let specs = match specs {
            Ok(specs) => specs,
            Err(e) => {
                self.fail(
                    TrackerError::Fetch {
                        message: format!("Invalid file_specs in step 0: {e}"),
                    },
                    FailedOperation::Fetch,
                );
                return;
            }
        };

        self.error = None;
        self.last_failure = None;
        if gated {
            self.uploads_pending = !specs.is_empty();
            self.file_specs = specs;
            self.status = SessionStatus::RequestingFiles;
        } else {
            self.file_specs = Vec::new();
            self.status = SessionStatus::Idle;
        }
    }

    pub fn on_fetch_failed(&mut self, message: String) {
        self.fail(TrackerError::Fetch { message }, FailedOperation::Fetch);
    }

    /// Replace the files collected for `spec_id`.
    pub fn record_files(&mut self, spec_id: &str, files: Vec<PathBuf>) -> CommandOutcome {
        if self.status != SessionStatus::RequestingFiles {
            return CommandOutcome::Ignored;
        }
        let Some(spec) = self.file_specs.iter().find(|s| s.id == spec_id) else {
            return CommandOutcome::Ignored;
        };
        if !spec.multiple && files.len() > 1 {
            return CommandOutcome::Rejected(TrackerError::TooManyFiles {
                label: spec.label.clone(),
                count: files.len(),
            });
        }

        if files.is_empty() {
            self.collected_files.remove(spec_id);
        } else {
            self.collected_files.insert(spec_id.to_string(), files);
        }
        self.uploads_pending = true;
        CommandOutcome::Started
    }

    /// Labels of required upload slots that have no files.
    pub fn missing_labels(&self) -> Vec<String> {
        self.file_specs
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| {
                self.collected_files
                    .get(&spec.id)
                    .map_or(true, Vec::is_empty)
            })
            .map(|spec| spec.label.clone())
            .collect()
    }

    /// Accept an execution command.
    ///
    /// Returns `Ok(None)` when the command is not valid in the current state.
    ///
    /// # Errors
    ///
    /// Returns a validation error, leaving the session untouched, when a
    /// required upload slot is empty.
    pub fn begin(&mut self, mode: RunMode) -> Result<Option<ExecutionPlan>, TrackerError> {
        if !self.status.accepts_execution() {
            return Ok(None);
        }
        if self.status == SessionStatus::RequestingFiles {
            let labels = self.missing_labels();
            if !labels.is_empty() {
                return Err(TrackerError::MissingFiles { labels });
            }
        }
        Ok(Some(self.start(mode)))
    }

    fn start(&mut self, mode: RunMode) -> ExecutionPlan {
        self.status = SessionStatus::Executing;
        self.error = None;
        self.last_failure = None;
        ExecutionPlan {
            session_id: self.id,
            pipeline_id: self.pipeline_id.clone(),
            mode,
            uploads: self.pending_uploads(),
        }
    }

    fn pending_uploads(&self) -> Vec<(String, Vec<PathBuf>)> {
        if !self.uploads_pending {
            return Vec::new();
        }
        self.collected_files
            .iter()
            .filter(|(_, files)| !files.is_empty())
            .map(|(id, files)| (id.clone(), files.clone()))
            .collect()
    }

    pub fn on_uploads_succeeded(&mut self) {
        self.uploads_pending = false;
    }

    /// A single-step call succeeded.
    pub fn on_step_advanced(&mut self, advance: StepAdvance) {
        let len = self.steps.len();
        let next = advance
            .next_index
            .unwrap_or(self.current_step_index + 1);
        if advance.finished || next >= len {
            self.complete(ExecutionResult {
                artifacts: advance.artifacts,
            });
        } else {
            self.current_step_index = next;
            self.status = SessionStatus::Idle;
        }
    }

    /// A full-run call succeeded.
    pub fn on_run_finished(&mut self, result: ExecutionResult) {
        self.complete(result);
    }

    fn complete(&mut self, result: ExecutionResult) {
        self.current_step_index = self.steps.len();
        self.status = SessionStatus::Success;
        self.error = None;
        self.result = Some(result);
    }

    /// A remote call failed. The cursor and collected files stay as they are.
    pub fn fail(&mut self, error: TrackerError, operation: FailedOperation) {
        self.status = SessionStatus::Error;
        self.error = Some(error);
        self.last_failure = Some(operation);
    }

    /// Advance the visual cursor by one while a full run is in flight.
    ///
    /// Returns false when nothing moved.
    pub fn tick(&mut self) -> bool {
        let cap = self.steps.len().saturating_sub(1);
        if self.status != SessionStatus::Executing || self.current_step_index >= cap {
            return false;
        }
        self.current_step_index += 1;
        true
    }

    /// Re-issue the operation class that failed.
    ///
    /// A failed execution restarts as a full run while the cursor is still on
    /// the first step and as a single-step advance once it has moved. Uploads
    /// that never succeeded are planned again either way.
    pub fn retry(&mut self) -> Option<RetryAction> {
        if self.status != SessionStatus::Error {
            return None;
        }
        match self.last_failure? {
            FailedOperation::Fetch => {
                self.status = SessionStatus::Loading;
                self.error = None;
                self.last_failure = None;
                Some(RetryAction::Fetch)
            }
            FailedOperation::Execute => {
                let mode = if self.current_step_index == 0 {
                    RunMode::All
                } else {
                    RunMode::OneStep
                };
                Some(RetryAction::Execute(self.start(mode)))
            }
        }
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let len = self.steps.len();
        let display = display_index(self.status, self.current_step_index, len);
        TrackerSnapshot {
            session_id: self.id,
            pipeline_id: self.pipeline_id.clone(),
            status: self.status,
            steps: self.steps.clone(),
            current_step_index: self.current_step_index,
            display_index: display,
            progress_percent: progress_percent(display, len),
            step_states: step_states(self.status, self.current_step_index, len),
            file_specs: self.file_specs.clone(),
            collected_files: self.collected_files.clone(),
            error: self.error.clone(),
            result: self.result.clone(),
            opened_at: self.opened_at,
        }
    }
}
