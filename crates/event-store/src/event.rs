use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{StreamId, StreamType};

/// Unique identifier for a stored event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event within its stream, used for optimistic concurrency.
///
/// Versions start at 1 for the first event of a stream and form a dense
/// sequence 1,2,3,… with no gaps. Version 0 denotes an empty stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of an empty stream (0).
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version of the first event (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A domain event awaiting persistence.
///
/// The store assigns the record id, the version, and the timestamp inside
/// the append transaction; callers only supply the type tag and the
/// JSON-encoded body.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Domain tag from the closed set (e.g. "OrderPlaced").
    pub event_type: String,

    /// The typed event body as JSON.
    pub payload: serde_json::Value,
}

impl NewEvent {
    /// Creates a new event from a type tag and payload.
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// An event as persisted in the store. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Globally unique record identifier.
    pub id: EventId,

    /// The stream (aggregate) this event belongs to.
    pub stream_id: StreamId,

    /// The kind of aggregate the stream belongs to.
    pub stream_type: StreamType,

    /// Position within the stream, starting at 1.
    pub version: Version,

    /// Domain tag from the closed set.
    pub event_type: String,

    /// The typed event body as JSON.
    pub payload: serde_json::Value,

    /// When the record was appended.
    pub created_at: DateTime<Utc>,
}
