//! Core domain event trait.

use event_store::NewEvent;

use crate::error::DomainError;

/// Trait for domain events.
///
/// Domain events are facts that have happened, named in past tense. Each
/// event serializes to a plain JSON body; the type tag travels separately
/// (the `event_type` column in the store, implicit in the broker topic).
/// Decoding is a table lookup keyed by that tag, so every aggregate's
/// event set is closed: an unrecognised tag is `UnknownEventKind`.
pub trait DomainEvent: Clone + Send + Sync + Sized {
    /// Returns the event type tag used as the serialization discriminator.
    fn event_type(&self) -> &'static str;

    /// Serializes the event body to JSON.
    fn to_payload(&self) -> serde_json::Result<serde_json::Value>;

    /// Decodes an event from its type tag and JSON body.
    fn from_payload(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError>;

    /// Packages the event for appending to the store.
    fn to_new_event(&self) -> serde_json::Result<NewEvent> {
        Ok(NewEvent::new(self.event_type(), self.to_payload()?))
    }
}
