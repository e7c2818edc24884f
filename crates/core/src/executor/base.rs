//! Base RemoteExecutor trait and supporting types.

use async_trait::async_trait;
use rf_protocol::pipeline_models::{PipelineDefinition, WorkflowSummary};
use rf_protocol::session_models::ExecutionResult;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outcome of a successful single-step call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepAdvance {
    /// Index of the next step, when the executor reports one.
    pub next_index: Option<usize>,

    /// True once the last step has run.
    pub finished: bool,

    /// Artifacts produced so far; only meaningful when `finished`.
    pub artifacts: Vec<String>,
}

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Failed to decode reply from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The executor answered but reported a failure.
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid executor URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ExecutorError {
    /// The text shown to the user for this failure.
    ///
    /// Executor-reported failures are shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ExecutorError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Contract of the Remote Executor.
///
/// All calls are keyed by pipeline id; the executor keeps one execution
/// cursor per pipeline, so `advance_one_step` runs whatever step is next on
/// its side.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn list_workflows(&self) -> ExecutorResult<Vec<WorkflowSummary>>;

    async fn fetch_definition(&self, pipeline_id: &str) -> ExecutorResult<PipelineDefinition>;

    /// Upload the files for one upload slot.
    async fn upload_files(
        &self,
        pipeline_id: &str,
        spec_id: &str,
        files: &[PathBuf],
    ) -> ExecutorResult<()>;

    async fn advance_one_step(&self, pipeline_id: &str) -> ExecutorResult<StepAdvance>;

    /// Run every remaining step. Resolves only when the executor finishes.
    async fn run_all(&self, pipeline_id: &str) -> ExecutorResult<ExecutionResult>;

    /// Discard the executor-side session for a pipeline.
    async fn reset_session(&self, pipeline_id: &str) -> ExecutorResult<()>;
}

/// File name sent with an uploaded part.
pub(crate) fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_is_verbatim() {
        let err = ExecutorError::Rejected("boom".to_string());
        assert_eq!(err.user_message(), "boom");
    }

    #[test]
    fn test_status_message_names_url_and_code() {
        let err = ExecutorError::Status {
            url: "http://localhost:8000/api/workflows/1/run".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        };
        let message = err.user_message();
        assert!(message.contains("502"));
        assert!(message.contains("/workflows/1/run"));
    }

    #[test]
    fn test_upload_name_uses_file_name() {
        assert_eq!(upload_name(Path::new("/data/notas_4B.xlsx")), "notas_4B.xlsx");
        assert_eq!(upload_name(Path::new("/")), "upload");
    }
}
