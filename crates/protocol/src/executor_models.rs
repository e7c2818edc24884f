//! Wire replies of the Remote Executor's HTTP API.
//!
//! The executor answers every call with a loosely-shaped JSON object. A
//! failure can be signalled by `status: "error"`, by an `error` field, or by
//! both, so every reply type exposes a `failure()` helper that folds those
//! cases into a single optional message.

use serde::{Deserialize, Serialize};

use crate::pipeline_models::{PipelineDefinition, Step, WorkflowMetadata, WorkflowSummary};
use crate::session_models::ExecutionResult;

/// Message used when the executor reports a failure without saying why.
pub const UNSPECIFIED_FAILURE: &str = "The remote executor reported a failure without a message";

/// The `status` field carried by step and run replies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

fn failure_message(message: &Option<String>, error: &Option<String>) -> String {
    message
        .clone()
        .or_else(|| error.clone())
        .unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string())
}

/// Reply to `GET /workflows/{id}/config`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigReply {
    #[serde(default)]
    pub pipeline: Vec<Step>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_metadata: Option<WorkflowMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConfigReply {
    /// Turn the reply into a definition for `pipeline_id`.
    ///
    /// # Errors
    ///
    /// Returns the executor's error message when one is present.
    pub fn into_definition(self, pipeline_id: &str) -> Result<PipelineDefinition, String> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(PipelineDefinition {
            id: pipeline_id.to_string(),
            steps: self.pipeline,
            metadata: self.workflow_metadata,
        })
    }
}

/// Reply to `POST /workflows/{id}/step`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReply {
    #[serde(default)]
    pub status: Option<ReplyStatus>,

    /// Index of the next step to execute.
    #[serde(default)]
    pub next_index: Option<usize>,

    /// True once the executor has run the last step.
    #[serde(default)]
    pub finished: bool,

    #[serde(default)]
    pub artifacts: Vec<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl StepReply {
    pub fn failure(&self) -> Option<String> {
        match (self.status, &self.error) {
            (Some(ReplyStatus::Success), None) => None,
            _ => Some(failure_message(&self.message, &self.error)),
        }
    }
}

/// Reply to `POST /workflows/{id}/run`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReply {
    #[serde(default)]
    pub status: Option<ReplyStatus>,

    #[serde(default)]
    pub artifacts: Vec<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl RunReply {
    pub fn failure(&self) -> Option<String> {
        match (self.status, &self.error) {
            (Some(ReplyStatus::Success), None) => None,
            _ => Some(failure_message(&self.message, &self.error)),
        }
    }

    pub fn into_result(self) -> ExecutionResult {
        ExecutionResult {
            artifacts: self.artifacts,
        }
    }
}

/// Reply to `POST /workflows/{id}/upload`.
///
/// Uploads are accepted unless the executor explicitly says otherwise.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReply {
    #[serde(default)]
    pub ok: Option<bool>,

    #[serde(default)]
    pub status: Option<ReplyStatus>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl UploadReply {
    pub fn failure(&self) -> Option<String> {
        let rejected = self.error.is_some()
            || self.ok == Some(false)
            || matches!(
                self.status,
                Some(ReplyStatus::Error) | Some(ReplyStatus::Unknown)
            );
        rejected.then(|| failure_message(&self.message, &self.error))
    }
}

/// Reply to `GET /workflows`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum WorkflowListReply {
    Workflows(Vec<WorkflowSummary>),
    Failed { error: String },
}
