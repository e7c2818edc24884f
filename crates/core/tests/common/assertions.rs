//! Waiting helpers and event assertions for tracker tests.

use rf_core::executor::mock::{MockCall, MockExecutor};
use rf_core::tracker::Tracker;
use rf_protocol::ipc::Event;
use rf_protocol::session_models::{SessionStatus, TrackerSnapshot};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const WAIT_LIMIT: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(2);

/// Poll the tracker until its snapshot satisfies `predicate`.
///
/// Panics after five seconds.
pub async fn wait_for_snapshot<F>(tracker: &Tracker, what: &str, predicate: F) -> TrackerSnapshot
where
    F: Fn(&TrackerSnapshot) -> bool,
{
    let waited = tokio::time::timeout(WAIT_LIMIT, async {
        loop {
            if let Some(snapshot) = tracker.snapshot().await {
                if predicate(&snapshot) {
                    return snapshot;
                }
            }
            tokio::time::sleep(POLL).await;
        }
    })
    .await;

    match waited {
        Ok(snapshot) => snapshot,
        Err(_) => panic!(
            "Timed out waiting for {what}; last snapshot: {:?}",
            tracker.snapshot().await
        ),
    }
}

/// Poll until the session reaches `status`.
pub async fn wait_for_status(tracker: &Tracker, status: SessionStatus) -> TrackerSnapshot {
    wait_for_snapshot(tracker, status.as_str(), |s| s.status == status).await
}

/// Poll until the mock has recorded at least `count` calls matching `predicate`.
pub async fn wait_for_calls<F>(mock: &MockExecutor, count: usize, predicate: F) -> Vec<MockCall>
where
    F: Fn(&MockCall) -> bool,
{
    let waited = tokio::time::timeout(WAIT_LIMIT, async {
        loop {
            let calls = mock.calls().await;
            if calls.iter().filter(|c| predicate(c)).count() >= count {
                return calls;
            }
            tokio::time::sleep(POLL).await;
        }
    })
    .await;

    match waited {
        Ok(calls) => calls,
        Err(_) => panic!(
            "Timed out waiting for {count} matching calls; got {:?}",
            mock.calls().await
        ),
    }
}

/// Receive events until one satisfies `predicate`; returns everything seen.
pub async fn collect_until<F>(events_rx: &mut UnboundedReceiver<Event>, predicate: F) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut seen = Vec::new();
    let waited = tokio::time::timeout(WAIT_LIMIT, async {
        while let Some(event) = events_rx.recv().await {
            let done = predicate(&event);
            seen.push(event);
            if done {
                return true;
            }
        }
        false
    })
    .await;

    assert!(
        matches!(waited, Ok(true)),
        "Expected event never arrived; saw {seen:?}"
    );
    seen
}

/// Every event currently buffered.
pub fn drain_events(events_rx: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        events.push(event);
    }
    events
}

/// Count uploads recorded by the mock.
pub fn count_uploads(calls: &[MockCall]) -> usize {
    calls
        .iter()
        .filter(|c| matches!(c, MockCall::UploadFiles { .. }))
        .count()
}

/// True when some event is an `ExecutionCompleted`.
pub fn has_completion(events: &[Event]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::ExecutionCompleted { .. }))
}
