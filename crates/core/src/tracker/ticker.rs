//! Visual progress ticker for full runs.
//!
//! The executor's full-run call only answers once every step is done, so
//! while it is in flight the tracker nudges the cursor forward on a fixed
//! interval. The ticker never reaches the last step on its own; only the
//! settled reply does that.

use crate::tracker::TrackerState;
use rf_protocol::ipc::Event;
use rf_protocol::session_models::SessionStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Handle to a running ticker task. Dropping it stops the task.
#[derive(Debug)]
pub struct ProgressTicker {
    session_id: Uuid,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Start ticking `session_id` every `period`.
    pub(crate) fn spawn(
        inner: Arc<Mutex<TrackerState>>,
        events_tx: mpsc::UnboundedSender<Event>,
        session_id: Uuid,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let mut state = inner.lock().await;
                let Some(session) = state.active_mut(session_id) else {
                    break;
                };
                if session.status != SessionStatus::Executing {
                    break;
                }
                if session.tick() {
                    tracing::trace!(%session_id, index = session.current_step_index, "tick");
                    let _ = events_tx.send(Event::SnapshotUpdated {
                        snapshot: session.snapshot(),
                    });
                }
            }
        });

        Self { session_id, handle }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
