//! Command pipeline error types.

use thiserror::Error;

/// Errors that can occur while executing commands or broker-driven
/// handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The caller violated an input constraint.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The availability precondition failed; nothing was reserved.
    #[error(
        "insufficient stock for product {product_id} (available: {available}, requested: {requested})"
    )]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// An aggregate that must already exist has no stream.
    #[error("order {order_id} not found")]
    OrderNotFound { order_id: String },

    /// An error occurred while decoding or replaying events.
    #[error(transparent)]
    Domain(#[from] domain::DomainError),

    /// An error occurred in the event store.
    #[error(transparent)]
    EventStore(#[from] event_store::EventStoreError),

    /// An error occurred in the read model.
    #[error(transparent)]
    ReadModel(#[from] projections::ReadModelError),

    /// The broker was unreachable or a publish failed. A publish failure
    /// after a successful append is tolerated: command-topic redelivery
    /// re-drives the handler, which short-circuits on the written stream
    /// and re-fires the publish.
    #[error(transparent)]
    Transport(#[from] messaging::MessagingError),
}
