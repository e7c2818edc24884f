//! Test fixtures for pipeline definitions and mock-backed trackers.

use rf_core::executor::mock::{MockExecutor, MockScript};
use rf_core::tracker::Tracker;
use rf_protocol::ipc::Event;
use rf_protocol::pipeline_models::{PipelineDefinition, Step};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Tick interval used by tests; short enough to observe several ticks.
pub const TEST_TICK: Duration = Duration::from_millis(10);

/// A pipeline built from plain step names.
pub fn create_pipeline(id: &str, steps: &[&str]) -> PipelineDefinition {
    PipelineDefinition::new(id, steps.iter().map(|name| Step::new(*name)).collect())
}

/// Three steps: load, chart, render.
pub fn create_three_step_pipeline(id: &str) -> PipelineDefinition {
    create_pipeline(id, &["InitRun", "GenerateGraphics", "RenderReport"])
}

/// A pipeline opening with a file-request step for slots `a` (single file,
/// label "A") and `b` (multiple files, label "B").
pub fn create_gated_pipeline(id: &str) -> PipelineDefinition {
    let request = Step::new("RequestUserFiles").with_params(json!({
        "file_specs": [
            {"id": "a", "label": "A", "multiple": false},
            {"id": "b", "label": "B", "multiple": true}
        ]
    }));
    PipelineDefinition::new(
        id,
        vec![request, Step::new("RunExcelETL"), Step::new("RenderReport")],
    )
}

/// A tracker backed by a mock executor following `script`.
pub fn create_tracker(script: MockScript) -> (Tracker, MockExecutor, UnboundedReceiver<Event>) {
    let mock = MockExecutor::new(script);
    let (tracker, events_rx) = Tracker::with_channel(Arc::new(mock.clone()), TEST_TICK);
    (tracker, mock, events_rx)
}
