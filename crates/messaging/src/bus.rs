use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Error type handlers may return; the consumer loop only logs it and
/// leaves the offset uncommitted so the broker redelivers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Processes one delivered message.
///
/// Handlers must be idempotent: delivery is at-least-once and the same
/// message may arrive any number of times.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> std::result::Result<(), HandlerError>;
}

/// Publishes messages to the broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a raw message to a topic, keyed by aggregate id.
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()>;
}

/// Extension trait providing convenience methods for publishers.
#[async_trait]
pub trait EventPublisherExt: EventPublisher {
    /// JSON-encodes an event body and publishes it.
    async fn publish_event<E>(&self, topic: &str, key: &str, event: &E) -> Result<()>
    where
        E: Serialize + Sync,
    {
        let payload = serde_json::to_vec(event)?;
        self.publish(topic, key, payload).await
    }
}

// Blanket implementation for all EventPublisher implementations
impl<T: EventPublisher + ?Sized> EventPublisherExt for T {}

/// Consumes messages from the broker in a named consumer group.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Runs a consumer loop for `topic` in `group`, delivering each
    /// message to `handler`. Offsets advance only on handler success;
    /// on error the message is retried per broker/group policy.
    ///
    /// Blocks until `shutdown` is cancelled, then drains and returns.
    async fn consume(
        &self,
        topic: &str,
        group: &str,
        shutdown: CancellationToken,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()>;
}
