//! Event bus client: publish and group-consume JSON messages.
//!
//! The broker envelope is the event body itself; the message key is the
//! aggregate id, so all events about one aggregate land on the same
//! partition and arrive in publish order. Delivery is at-least-once:
//! handlers must be idempotent, and offsets advance only after a handler
//! succeeds.

pub mod bus;
pub mod error;
pub mod kafka;
pub mod memory;

pub use bus::{EventPublisher, EventPublisherExt, EventSubscriber, HandlerError, MessageHandler};
pub use error::{MessagingError, Result};
pub use kafka::KafkaBroker;
pub use memory::InMemoryBroker;
