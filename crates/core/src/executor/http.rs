//! HTTP/JSON client for the Remote Executor.

use crate::config::models::AppConfig;
use crate::executor::base::{
    upload_name, ExecutorError, ExecutorResult, RemoteExecutor, StepAdvance,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use rf_protocol::executor_models::{
    ConfigReply, RunReply, StepReply, UploadReply, WorkflowListReply,
};
use rf_protocol::pipeline_models::{PipelineDefinition, WorkflowSummary};
use rf_protocol::session_models::ExecutionResult;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Talks to the executor at `base_url`.
#[derive(Clone)]
pub struct HttpExecutor {
    http: reqwest::Client,
    base_url: String,
    base: reqwest::Url,
}

/// Error fields the executor may put in a non-2xx body.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpExecutor {
    /// # Errors
    ///
    /// Fails when `base_url` cannot carry a path or the underlying HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> ExecutorResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let base = reqwest::Url::parse(&base_url).map_err(|e| ExecutorError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ExecutorError::InvalidUrl {
                url: base_url,
                reason: "URL cannot carry a path".to_string(),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ExecutorError::Client)?;
        Ok(Self {
            http,
            base_url,
            base,
        })
    }

    pub fn from_config(config: &AppConfig) -> ExecutorResult<Self> {
        Self::new(config.api_base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/workflows/<pipeline_id>/<action>`, with the id as one
    /// percent-encoded path segment.
    fn workflow_url(&self, pipeline_id: &str, action: &str) -> ExecutorResult<String> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ExecutorError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push("workflows")
            .push(pipeline_id)
            .push(action);
        Ok(url.into())
    }

    async fn send(&self, req: reqwest::RequestBuilder, url: &str) -> ExecutorResult<String> {
        let resp = req.send().await.map_err(|source| ExecutorError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|source| ExecutorError::Transport {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(url = %url, status = %status, bytes = body.len(), "executor reply");

        if !status.is_success() {
            // Prefer the executor's own explanation when the body carries one.
            if let Ok(ErrorBody { message, error }) = serde_json::from_str::<ErrorBody>(&body) {
                if let Some(text) = message.or(error) {
                    return Err(ExecutorError::Rejected(text));
                }
            }
            return Err(ExecutorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: preview_body(&body),
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ExecutorResult<T> {
        tracing::debug!(url = %url, "GET");
        let body = self.send(self.http.get(url), url).await?;
        decode(&body, url)
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str) -> ExecutorResult<T> {
        tracing::debug!(url = %url, "POST");
        let body = self.send(self.http.post(url), url).await?;
        decode(&body, url)
    }
}

fn decode<T: DeserializeOwned>(body: &str, url: &str) -> ExecutorResult<T> {
    serde_json::from_str(body).map_err(|source| ExecutorError::Decode {
        url: url.to_string(),
        source,
    })
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

#[async_trait]
impl RemoteExecutor for HttpExecutor {
    async fn list_workflows(&self) -> ExecutorResult<Vec<WorkflowSummary>> {
        let url = format!("{}/workflows", self.base_url);
        match self.get_json::<WorkflowListReply>(&url).await? {
            WorkflowListReply::Workflows(rows) => Ok(rows),
            WorkflowListReply::Failed { error } => Err(ExecutorError::Rejected(error)),
        }
    }

    async fn fetch_definition(&self, pipeline_id: &str) -> ExecutorResult<PipelineDefinition> {
        let url = self.workflow_url(pipeline_id, "config")?;
        let reply: ConfigReply = self.get_json(&url).await?;
        reply
            .into_definition(pipeline_id)
            .map_err(ExecutorError::Rejected)
    }

    async fn upload_files(
        &self,
        pipeline_id: &str,
        spec_id: &str,
        files: &[PathBuf],
    ) -> ExecutorResult<()> {
        let url = self.workflow_url(pipeline_id, "upload")?;
        let mut form = Form::new().text("input_key", spec_id.to_string());
        for path in files {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| ExecutorError::FileRead {
                    path: path.clone(),
                    source,
                })?;
            form = form.part("files", Part::bytes(bytes).file_name(upload_name(path)));
        }

        tracing::debug!(url = %url, spec_id, files = files.len(), "POST multipart");
        let body = self.send(self.http.post(&url).multipart(form), &url).await?;

        // Some executor versions answer uploads with an empty body.
        if body.trim().is_empty() {
            return Ok(());
        }
        let reply: UploadReply = decode(&body, &url)?;
        match reply.failure() {
            Some(message) => Err(ExecutorError::Rejected(message)),
            None => Ok(()),
        }
    }

    async fn advance_one_step(&self, pipeline_id: &str) -> ExecutorResult<StepAdvance> {
        let url = self.workflow_url(pipeline_id, "step")?;
        let reply: StepReply = self.post_json(&url).await?;
        if let Some(message) = reply.failure() {
            return Err(ExecutorError::Rejected(message));
        }
        Ok(StepAdvance {
            next_index: reply.next_index,
            finished: reply.finished,
            artifacts: reply.artifacts,
        })
    }

    async fn run_all(&self, pipeline_id: &str) -> ExecutorResult<ExecutionResult> {
        let url = self.workflow_url(pipeline_id, "run")?;
        let reply: RunReply = self.post_json(&url).await?;
        match reply.failure() {
            Some(message) => Err(ExecutorError::Rejected(message)),
            None => Ok(reply.into_result()),
        }
    }

    async fn reset_session(&self, pipeline_id: &str) -> ExecutorResult<()> {
        let url = self.workflow_url(pipeline_id, "reset")?;
        tracing::debug!(url = %url, "POST");
        self.send(self.http.post(&url), &url).await?;
        Ok(())
    }
}
