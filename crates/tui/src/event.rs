//! Event handling types for the TUI.

/// Status of a key event after a handler has seen it.
///
/// Handlers are tried in order (file input line, then the active view, then
/// global keys); the first one that returns `Consumed` stops the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// The event was handled and should not be propagated further.
    Consumed,
    /// The event should be passed to the next handler.
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == EventStatus::Consumed
    }
}
