//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between a host UI (the TUI) and the tracker running in the core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the host to the tracker
//! - `Event`: Updates sent from the tracker to the host
//!
//! Communication is channel-based, so the host stays responsive while remote
//! calls are in flight.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;
use uuid::Uuid;

use crate::pipeline_models::WorkflowSummary;
use crate::session_models::{ExecutionResult, TrackerError, TrackerSnapshot};

/// Operations sent from the host to the tracker.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "recordFiles",
///   "payload": {
///     "spec_id": "notas",
///     "files": ["/data/notas_4B.xlsx"]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Fetch the list of workflows known to the executor.
    ListWorkflows,

    /// Open a tracker session for a pipeline, discarding any current one.
    OpenTracker { pipeline_id: String },

    /// Replace the files collected for one upload slot.
    RecordFiles {
        spec_id: String,
        #[ts(type = "Array<string>")]
        files: Vec<PathBuf>,
    },

    /// Execute the next step only.
    AdvanceOneStep,

    /// Execute every remaining step.
    RunAll,

    /// Re-issue the operation that failed.
    Retry,

    /// Close the current session.
    CloseTracker,

    /// Stop processing operations.
    Shutdown,
}

/// Events sent from the tracker to the host.
///
/// ```json
/// {
///   "type": "executionFailed",
///   "payload": {
///     "session_id": "uuid-here",
///     "error": { "kind": "execution", "message": "boom" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The executor's workflow list.
    WorkflowsListed { workflows: Vec<WorkflowSummary> },

    /// The workflow list could not be retrieved.
    WorkflowsUnavailable { message: String },

    /// A new session started loading.
    SessionOpened {
        #[ts(type = "string")]
        session_id: Uuid,
        pipeline_id: String,
    },

    /// Session state changed; the snapshot replaces any previous one.
    SnapshotUpdated { snapshot: TrackerSnapshot },

    /// Every step completed.
    ExecutionCompleted {
        #[ts(type = "string")]
        session_id: Uuid,
        result: ExecutionResult,
    },

    /// A remote call failed and the session is now in error.
    ExecutionFailed {
        #[ts(type = "string")]
        session_id: Uuid,
        error: TrackerError,
    },

    /// A command was rejected by input validation.
    FilesRejected {
        #[ts(type = "string")]
        session_id: Uuid,
        error: TrackerError,
    },

    /// The session was closed (explicitly or by opening another one).
    SessionClosed {
        #[ts(type = "string")]
        session_id: Uuid,
        pipeline_id: String,
    },
}

impl Event {
    /// Session the event belongs to, if any.
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Event::WorkflowsListed { .. } | Event::WorkflowsUnavailable { .. } => None,
            Event::SnapshotUpdated { snapshot } => Some(snapshot.session_id),
            Event::SessionOpened { session_id, .. }
            | Event::ExecutionCompleted { session_id, .. }
            | Event::ExecutionFailed { session_id, .. }
            | Event::FilesRejected { session_id, .. }
            | Event::SessionClosed { session_id, .. } => Some(*session_id),
        }
    }
}
