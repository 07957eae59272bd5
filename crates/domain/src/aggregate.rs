//! Core aggregate trait.

use common::{StreamId, StreamType};
use event_store::{EventRecord, Version};

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Trait for aggregates in an event-sourced system.
///
/// Aggregates are transient value types: they are reconstructed on demand
/// by replaying their stream and are never persisted directly.
///
/// `apply` must be pure and deterministic. It cannot fail: events are
/// facts, and the closed event enum means unknown kinds are rejected at
/// decode time, before `apply` ever sees them. Every successful apply
/// advances the aggregate version by one.
pub trait Aggregate: Send + Sync + Sized {
    /// The closed set of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the stream type this aggregate is stored under.
    fn stream_type() -> StreamType;

    /// Creates a fresh aggregate for the given stream id.
    fn new(id: StreamId) -> Self;

    /// Returns the aggregate's stream id.
    fn id(&self) -> &StreamId;

    /// Returns the current version: the number of events applied so far.
    fn version(&self) -> Version;

    /// Applies an event, updating state and incrementing the version.
    fn apply(&mut self, event: Self::Event);

    /// Rebuilds state by decoding and applying stored records in order.
    fn rehydrate(&mut self, records: &[EventRecord]) -> Result<(), DomainError> {
        for record in records {
            let event = Self::Event::from_payload(&record.event_type, record.payload.clone())?;
            self.apply(event);
        }
        Ok(())
    }
}
