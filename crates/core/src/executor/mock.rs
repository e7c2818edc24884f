//! Mock executor implementation for testing.
//!
//! By default the mock behaves like a well-mannered executor: it serves the
//! definitions it was given, accepts uploads, and walks a per-pipeline
//! cursor on every step call. Scripted failures and replies are consumed in
//! order before falling back to that behaviour. Every call is recorded.

use crate::executor::base::{ExecutorError, ExecutorResult, RemoteExecutor, StepAdvance};
use async_trait::async_trait;
use rf_protocol::pipeline_models::{PipelineDefinition, WorkflowSummary};
use rf_protocol::session_models::ExecutionResult;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListWorkflows,
    FetchDefinition {
        pipeline_id: String,
    },
    UploadFiles {
        pipeline_id: String,
        spec_id: String,
        files: Vec<PathBuf>,
    },
    AdvanceOneStep {
        pipeline_id: String,
    },
    RunAll {
        pipeline_id: String,
    },
    ResetSession {
        pipeline_id: String,
    },
}

impl MockCall {
    /// Step and full-run calls.
    pub fn is_execution(&self) -> bool {
        matches!(self, MockCall::AdvanceOneStep { .. } | MockCall::RunAll { .. })
    }
}

/// What the mock answers.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    workflows: Option<Vec<WorkflowSummary>>,
    workflows_error: Option<String>,
    definitions: HashMap<String, PipelineDefinition>,
    fetch_failures: VecDeque<String>,
    upload_failures: HashMap<String, VecDeque<String>>,
    step_replies: VecDeque<Result<StepAdvance, String>>,
    run_replies: VecDeque<Result<ExecutionResult, String>>,
    artifacts: Vec<String>,
    gated: bool,
}

impl MockScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, definition: PipelineDefinition) -> Self {
        self.definitions.insert(definition.id.clone(), definition);
        self
    }

    pub fn with_workflows(mut self, workflows: Vec<WorkflowSummary>) -> Self {
        self.workflows = Some(workflows);
        self
    }

    pub fn fail_workflows(mut self, message: &str) -> Self {
        self.workflows_error = Some(message.to_string());
        self
    }

    /// Fail the next definition fetch.
    pub fn fail_fetch(mut self, message: &str) -> Self {
        self.fetch_failures.push_back(message.to_string());
        self
    }

    /// Fail the next upload for `spec_id`.
    pub fn fail_upload(mut self, spec_id: &str, message: &str) -> Self {
        self.upload_failures
            .entry(spec_id.to_string())
            .or_default()
            .push_back(message.to_string());
        self
    }

    /// Answer the next step call with `reply` instead of walking the cursor.
    pub fn with_step_reply(mut self, reply: Result<StepAdvance, String>) -> Self {
        self.step_replies.push_back(reply);
        self
    }

    /// Fail the next full run.
    pub fn fail_run(mut self, message: &str) -> Self {
        self.run_replies.push_back(Err(message.to_string()));
        self
    }

    /// Artifacts reported when a pipeline finishes.
    pub fn with_artifacts(mut self, artifacts: &[&str]) -> Self {
        self.artifacts = artifacts.iter().map(|a| (*a).to_string()).collect();
        self
    }

    /// Hold every step and full-run call until [`MockExecutor::release`].
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }
}

#[derive(Default)]
struct MockState {
    script: MockScript,
    cursors: HashMap<String, usize>,
    calls: Vec<MockCall>,
}

#[derive(Clone)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockExecutor {
    pub fn new(script: MockScript) -> Self {
        let gate = script.gated.then(|| Arc::new(Semaphore::new(0)));
        Self {
            state: Arc::new(Mutex::new(MockState {
                script,
                ..MockState::default()
            })),
            gate,
        }
    }

    /// Let `n` held execution calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of step and full-run calls received so far.
    pub async fn execution_calls(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.is_execution())
            .count()
    }

    async fn record(&self, call: MockCall) {
        tracing::debug!(?call, "mock executor call");
        self.state.lock().await.calls.push(call);
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

fn step_count(state: &MockState, pipeline_id: &str) -> usize {
    state
        .script
        .definitions
        .get(pipeline_id)
        .map_or(0, |d| d.steps.len())
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    async fn list_workflows(&self) -> ExecutorResult<Vec<WorkflowSummary>> {
        self.record(MockCall::ListWorkflows).await;
        let state = self.state.lock().await;
        if let Some(message) = &state.script.workflows_error {
            return Err(ExecutorError::Rejected(message.clone()));
        }
        Ok(state.script.workflows.clone().unwrap_or_default())
    }

    async fn fetch_definition(&self, pipeline_id: &str) -> ExecutorResult<PipelineDefinition> {
        self.record(MockCall::FetchDefinition {
            pipeline_id: pipeline_id.to_string(),
        })
        .await;
        let mut state = self.state.lock().await;
        if let Some(message) = state.script.fetch_failures.pop_front() {
            return Err(ExecutorError::Rejected(message));
        }
        state
            .script
            .definitions
            .get(pipeline_id)
            .cloned()
            .ok_or_else(|| ExecutorError::Rejected(format!("Workflow {pipeline_id} not found")))
    }

    async fn upload_files(
        &self,
        pipeline_id: &str,
        spec_id: &str,
        files: &[PathBuf],
    ) -> ExecutorResult<()> {
        self.record(MockCall::UploadFiles {
            pipeline_id: pipeline_id.to_string(),
            spec_id: spec_id.to_string(),
            files: files.to_vec(),
        })
        .await;
        let mut state = self.state.lock().await;
        match state
            .script
            .upload_failures
            .get_mut(spec_id)
            .and_then(VecDeque::pop_front)
        {
            Some(message) => Err(ExecutorError::Rejected(message)),
            None => Ok(()),
        }
    }

    async fn advance_one_step(&self, pipeline_id: &str) -> ExecutorResult<StepAdvance> {
        self.record(MockCall::AdvanceOneStep {
            pipeline_id: pipeline_id.to_string(),
        })
        .await;
        self.wait_for_gate().await;

        let mut state = self.state.lock().await;
        if let Some(reply) = state.script.step_replies.pop_front() {
            return reply.map_err(ExecutorError::Rejected);
        }

        let len = step_count(&state, pipeline_id);
        let artifacts = state.script.artifacts.clone();
        let cursor = state.cursors.entry(pipeline_id.to_string()).or_insert(0);
        *cursor = (*cursor + 1).min(len);
        let finished = *cursor >= len;
        Ok(StepAdvance {
            next_index: Some(*cursor),
            finished,
            artifacts: if finished { artifacts } else { Vec::new() },
        })
    }

    async fn run_all(&self, pipeline_id: &str) -> ExecutorResult<ExecutionResult> {
        self.record(MockCall::RunAll {
            pipeline_id: pipeline_id.to_string(),
        })
        .await;
        self.wait_for_gate().await;

        let mut state = self.state.lock().await;
        if let Some(reply) = state.script.run_replies.pop_front() {
            return reply.map_err(ExecutorError::Rejected);
        }

        let len = step_count(&state, pipeline_id);
        state.cursors.insert(pipeline_id.to_string(), len);
        Ok(ExecutionResult {
            artifacts: state.script.artifacts.clone(),
        })
    }

    async fn reset_session(&self, pipeline_id: &str) -> ExecutorResult<()> {
        self.record(MockCall::ResetSession {
            pipeline_id: pipeline_id.to_string(),
        })
        .await;
        self.state.lock().await.cursors.remove(pipeline_id);
        Ok(())
    }
}
