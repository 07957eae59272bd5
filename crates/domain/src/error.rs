//! Domain error types.

use thiserror::Error;

/// Errors that can occur while decoding and replaying domain events.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A stored record carries an event type outside the aggregate's
    /// closed set. Streams are immutable, so this is data corruption,
    /// not a recoverable condition.
    #[error("unknown event type for {aggregate}: {event_type}")]
    UnknownEventKind {
        aggregate: &'static str,
        event_type: String,
    },

    /// An event payload failed to (de)serialize.
    #[error("event payload error: {0}")]
    Payload(#[from] serde_json::Error),
}
