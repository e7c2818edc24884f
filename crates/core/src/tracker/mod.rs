//! Execution Tracker.
//!
//! The tracker owns one [`ExecutionSession`] at a time and drives it against
//! a [`RemoteExecutor`]. Commands return immediately; remote calls run on
//! spawned tasks tagged with the session id, and every state change is
//! published as an [`Event`] on the tracker's event channel.
//!
//! A remote call that settles after its session was closed or replaced is
//! discarded.

pub mod progress;
pub mod session;
pub mod ticker;

pub use session::{ExecutionPlan, ExecutionSession, FailedOperation, RetryAction, RunMode};
pub use ticker::ProgressTicker;

use crate::executor::base::{ExecutorResult, RemoteExecutor};
use rf_protocol::ipc::{Event, Op};
use rf_protocol::pipeline_models::WorkflowSummary;
use rf_protocol::session_models::{CommandOutcome, SessionStatus, TrackerError, TrackerSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

/// Shortest ticker period; `tokio::time::interval` cannot tick at zero.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// State guarded by the tracker lock.
#[derive(Debug, Default)]
pub(crate) struct TrackerState {
    session: Option<ExecutionSession>,
    ticker: Option<ProgressTicker>,
}

impl TrackerState {
    /// The session, if it is still the one identified by `session_id`.
    pub(crate) fn active_mut(&mut self, session_id: Uuid) -> Option<&mut ExecutionSession> {
        self.session.as_mut().filter(|s| s.id == session_id)
    }
}

/// Controller for one pipeline execution view.
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct Tracker {
    executor: Arc<dyn RemoteExecutor>,
    inner: Arc<Mutex<TrackerState>>,
    events_tx: mpsc::UnboundedSender<Event>,
    tick_interval: Duration,
}

impl Tracker {
    pub fn new(
        executor: Arc<dyn RemoteExecutor>,
        events_tx: mpsc::UnboundedSender<Event>,
        tick_interval: Duration,
    ) -> Self {
        if tick_interval < MIN_TICK_INTERVAL {
            tracing::warn!(?tick_interval, "tick interval too short; using {MIN_TICK_INTERVAL:?}");
        }
        Self {
            executor,
            inner: Arc::new(Mutex::new(TrackerState::default())),
            events_tx,
            tick_interval: tick_interval.max(MIN_TICK_INTERVAL),
        }
    }

    /// A tracker together with the receiving end of its event channel.
    pub fn with_channel(
        executor: Arc<dyn RemoteExecutor>,
        tick_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (Self::new(executor, events_tx, tick_interval), events_rx)
    }

    fn emit(&self, event: Event) {
        if self.events_tx.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }

    fn emit_snapshot(&self, session: &ExecutionSession) {
        self.emit(Event::SnapshotUpdated {
            snapshot: session.snapshot(),
        });
    }

    /// Publish the state a remote call left the session in.
    fn emit_settled(&self, session: &ExecutionSession) {
        self.emit_snapshot(session);
        match (session.status, &session.error, &session.result) {
            (SessionStatus::Error, Some(error), _) => self.emit(Event::ExecutionFailed {
                session_id: session.id,
                error: error.clone(),
            }),
            (SessionStatus::Success, _, Some(result)) => self.emit(Event::ExecutionCompleted {
                session_id: session.id,
                result: result.clone(),
            }),
            _ => {}
        }
    }

    /// Open a session for `pipeline_id`, closing any current one.
    ///
    /// Never fails: a failed fetch puts the new session in `error`.
    pub async fn open(&self, pipeline_id: &str) -> Uuid {
        let session = ExecutionSession::new(pipeline_id);
        let session_id = session.id;

        let pending_reset = {
            let mut state = self.inner.lock().await;
            let pending_reset = self.discard(&mut state);
            tracing::info!(%session_id, pipeline_id, "opening tracker session");
            self.emit(Event::SessionOpened {
                session_id,
                pipeline_id: pipeline_id.to_string(),
            });
            self.emit_snapshot(&session);
            state.session = Some(session);
            pending_reset
        };

        self.spawn_fetch(session_id, pipeline_id.to_string(), pending_reset);
        session_id
    }

    /// Drop the current session and its ticker, then reset it remotely.
    fn discard(&self, state: &mut TrackerState) -> Option<JoinHandle<()>> {
        state.ticker = None;
        let session = state.session.take()?;
        tracing::info!(session_id = %session.id, pipeline_id = %session.pipeline_id, "closing tracker session");
        self.emit(Event::SessionClosed {
            session_id: session.id,
            pipeline_id: session.pipeline_id.clone(),
        });

        let executor = Arc::clone(&self.executor);
        let pipeline_id = session.pipeline_id;
        Some(tokio::spawn(async move {
            if let Err(err) = executor.reset_session(&pipeline_id).await {
                tracing::warn!(%pipeline_id, error = %err, "failed to reset executor session");
            }
        }))
    }

    fn spawn_fetch(
        &self,
        session_id: Uuid,
        pipeline_id: String,
        after: Option<JoinHandle<()>>,
    ) {
        let this = self.clone();
        tokio::spawn(async move {
            // Let the previous session's reset reach the executor first.
            if let Some(reset) = after {
                let _ = reset.await;
            }

            let outcome = this.executor.fetch_definition(&pipeline_id).await;
            let mut state = this.inner.lock().await;
            let Some(session) = state.active_mut(session_id) else {
                tracing::debug!(%session_id, "discarding definition for a closed session");
                return;
            };
            match outcome {
                Ok(definition) => {
                    tracing::info!(%session_id, steps = definition.steps.len(), "pipeline definition loaded");
                    session.on_definition(definition);
                }
                Err(err) => {
                    tracing::warn!(%session_id, error = %err, "failed to fetch pipeline definition");
                    session.on_fetch_failed(err.user_message());
                }
            }
            this.emit_settled(session);
        });
    }

    /// Replace the files collected for one upload slot.
    pub async fn record_files(&self, spec_id: &str, files: Vec<PathBuf>) -> CommandOutcome {
        let mut state = self.inner.lock().await;
        let Some(session) = state.session.as_mut() else {
            return CommandOutcome::Ignored;
        };

        let outcome = session.record_files(spec_id, files);
        match &outcome {
            CommandOutcome::Started => self.emit_snapshot(session),
            CommandOutcome::Rejected(error) => self.emit(Event::FilesRejected {
                session_id: session.id,
                error: error.clone(),
            }),
            CommandOutcome::Ignored => {
                tracing::warn!(spec_id, status = %session.status, "ignoring files for this session state");
            }
        }
        outcome
    }

    /// Execute the next step only.
    pub async fn advance_one_step(&self) -> CommandOutcome {
        self.execute(RunMode::OneStep).await
    }

    /// Execute every remaining step, ticking visual progress meanwhile.
    pub async fn run_all(&self) -> CommandOutcome {
        self.execute(RunMode::All).await
    }

    async fn execute(&self, mode: RunMode) -> CommandOutcome {
        let mut state = self.inner.lock().await;
        let Some(session) = state.session.as_mut() else {
            return CommandOutcome::Ignored;
        };

        match session.begin(mode) {
            Ok(Some(plan)) => {
                tracing::info!(session_id = %plan.session_id, ?mode, uploads = plan.uploads.len(), "starting execution");
                self.emit_snapshot(session);
                drop(state);
                self.spawn_execution(plan);
                CommandOutcome::Started
            }
            Ok(None) => {
                tracing::debug!(status = %session.status, ?mode, "execution command ignored");
                CommandOutcome::Ignored
            }
            Err(error) => {
                self.emit(Event::FilesRejected {
                    session_id: session.id,
                    error: error.clone(),
                });
                CommandOutcome::Rejected(error)
            }
        }
    }

    /// Re-issue the operation that failed.
    pub async fn retry(&self) -> CommandOutcome {
        let mut state = self.inner.lock().await;
        let Some(session) = state.session.as_mut() else {
            return CommandOutcome::Ignored;
        };
        let Some(action) = session.retry() else {
            return CommandOutcome::Ignored;
        };

        let session_id = session.id;
        let pipeline_id = session.pipeline_id.clone();
        tracing::info!(%session_id, ?action, "retrying");
        self.emit_snapshot(session);
        drop(state);

        match action {
            RetryAction::Fetch => self.spawn_fetch(session_id, pipeline_id, None),
            RetryAction::Execute(plan) => self.spawn_execution(plan),
        }
        CommandOutcome::Started
    }

    /// Close the current session, if any.
    pub async fn close(&self) -> CommandOutcome {
        let mut state = self.inner.lock().await;
        match self.discard(&mut state) {
            Some(_) => CommandOutcome::Started,
            None => CommandOutcome::Ignored,
        }
    }

    /// Close the current session and wait for its remote reset to finish.
    pub async fn shutdown(&self) {
        let pending_reset = {
            let mut state = self.inner.lock().await;
            self.discard(&mut state)
        };
        if let Some(reset) = pending_reset {
            let _ = reset.await;
        }
    }

    pub async fn snapshot(&self) -> Option<TrackerSnapshot> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(ExecutionSession::snapshot)
    }

    /// True while a progress ticker is alive.
    pub async fn is_ticking(&self) -> bool {
        self.inner
            .lock()
            .await
            .ticker
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub async fn list_workflows(&self) -> ExecutorResult<Vec<WorkflowSummary>> {
        self.executor.list_workflows().await
    }

    fn spawn_execution(&self, plan: ExecutionPlan) {
        let this = self.clone();
        tokio::spawn(async move { this.run_plan(plan).await });
    }

    async fn run_plan(&self, plan: ExecutionPlan) {
        let ExecutionPlan {
            session_id,
            pipeline_id,
            mode,
            uploads,
        } = plan;
        let failed = FailedOperation::Execute;

        if !uploads.is_empty() {
            let outcome = self.upload_batch(&pipeline_id, uploads).await;
            let mut state = self.inner.lock().await;
            let Some(session) = state.active_mut(session_id) else {
                tracing::debug!(%session_id, "discarding upload result for a closed session");
                return;
            };
            match outcome {
                Ok(()) => session.on_uploads_succeeded(),
                Err(error) => {
                    session.fail(error, failed);
                    self.emit_settled(session);
                    return;
                }
            }
        }

        match mode {
            RunMode::OneStep => {
                let outcome = self.executor.advance_one_step(&pipeline_id).await;
                let mut state = self.inner.lock().await;
                let Some(session) = state.active_mut(session_id) else {
                    tracing::debug!(%session_id, "discarding step reply for a closed session");
                    return;
                };
                match outcome {
                    Ok(advance) => session.on_step_advanced(advance),
                    Err(err) => session.fail(
                        TrackerError::Execution {
                            message: err.user_message(),
                        },
                        failed,
                    ),
                }
                self.emit_settled(session);
            }
            RunMode::All => {
                {
                    let mut state = self.inner.lock().await;
                    if state.active_mut(session_id).is_none() {
                        return;
                    }
                    state.ticker = Some(ProgressTicker::spawn(
                        Arc::clone(&self.inner),
                        self.events_tx.clone(),
                        session_id,
                        self.tick_interval,
                    ));
                }

                let outcome = self.executor.run_all(&pipeline_id).await;
                let mut state = self.inner.lock().await;
                if state
                    .ticker
                    .as_ref()
                    .is_some_and(|t| t.session_id() == session_id)
                {
                    state.ticker = None;
                }
                let Some(session) = state.active_mut(session_id) else {
                    tracing::debug!(%session_id, "discarding run reply for a closed session");
                    return;
                };
                match outcome {
                    Ok(result) => session.on_run_finished(result),
                    Err(err) => session.fail(
                        TrackerError::Execution {
                            message: err.user_message(),
                        },
                        failed,
                    ),
                }
                self.emit_settled(session);
            }
        }
    }

    /// Upload every file set concurrently. Any failure fails the batch.
    async fn upload_batch(
        &self,
        pipeline_id: &str,
        uploads: Vec<(String, Vec<PathBuf>)>,
    ) -> Result<(), TrackerError> {
        let mut set = JoinSet::new();
        for (spec_id, files) in uploads {
            let executor = Arc::clone(&self.executor);
            let pipeline_id = pipeline_id.to_string();
            set.spawn(async move {
                let outcome = executor.upload_files(&pipeline_id, &spec_id, &files).await;
                (spec_id, outcome)
            });
        }

        let mut first_failure = None;
        while let Some(joined) = set.join_next().await {
            let failure = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((spec_id, Err(err))) => TrackerError::Upload {
                    spec_id,
                    message: err.user_message(),
                },
                Err(join_err) => TrackerError::Execution {
                    message: format!("Upload task failed: {join_err}"),
                },
            };
            tracing::warn!(error = %failure, "upload failed");
            if first_failure.is_none() {
                first_failure = Some(failure);
            }
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Apply one host operation. Returns false once the loop should stop.
    pub async fn handle_op(&self, op: Op) -> bool {
        match op {
            Op::ListWorkflows => {
                let this = self.clone();
                tokio::spawn(async move {
                    match this.list_workflows().await {
                        Ok(workflows) => this.emit(Event::WorkflowsListed { workflows }),
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to list workflows");
                            this.emit(Event::WorkflowsUnavailable {
                                message: err.user_message(),
                            });
                        }
                    }
                });
            }
            Op::OpenTracker { pipeline_id } => {
                self.open(&pipeline_id).await;
            }
            Op::RecordFiles { spec_id, files } => {
                self.record_files(&spec_id, files).await;
            }
            Op::AdvanceOneStep => {
                self.advance_one_step().await;
            }
            Op::RunAll => {
                self.run_all().await;
            }
            Op::Retry => {
                self.retry().await;
            }
            Op::CloseTracker => {
                self.close().await;
            }
            Op::Shutdown => {
                self.shutdown().await;
                return false;
            }
        }
        true
    }
}

/// Consume host operations until `Shutdown` or until every sender is gone.
pub async fn run_tracker_loop(tracker: Tracker, mut op_rx: mpsc::UnboundedReceiver<Op>) {
    while let Some(op) = op_rx.recv().await {
        tracing::debug!(?op, "tracker op");
        if !tracker.handle_op(op).await {
            break;
        }
    }
    tracing::info!("tracker loop stopped");
}
