use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::bus::{EventPublisher, EventSubscriber, MessageHandler};

/// One published message: (key, payload).
type StoredMessage = (String, Vec<u8>);

struct TopicState {
    history: Vec<StoredMessage>,
    live: broadcast::Sender<StoredMessage>,
}

impl TopicState {
    fn new() -> Self {
        let (live, _) = broadcast::channel(256);
        Self {
            history: Vec::new(),
            live,
        }
    }
}

/// In-memory broker implementation for testing.
///
/// Publishes append to a per-topic history and fan out to live
/// consumers. A consumer first replays the topic history, then receives
/// new messages until cancelled, mirroring `auto.offset.reset=earliest`.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    topics: Arc<Mutex<HashMap<String, TopicState>>>,
}

impl InMemoryBroker {
    /// Creates a new empty in-memory broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all messages published to a topic, in publish order.
    pub fn published(&self, topic: &str) -> Vec<StoredMessage> {
        self.topics
            .lock()
            .expect("broker lock poisoned")
            .get(topic)
            .map(|t| t.history.clone())
            .unwrap_or_default()
    }

    /// Returns the number of messages published to a topic.
    pub fn published_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .expect("broker lock poisoned")
            .get(topic)
            .map(|t| t.history.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventPublisher for InMemoryBroker {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()> {
        let mut topics = self.topics.lock().expect("broker lock poisoned");
        let state = topics.entry(topic.to_string()).or_insert_with(TopicState::new);

        let message = (key.to_string(), payload);
        state.history.push(message.clone());
        // No live consumers is fine; they will replay from history.
        let _ = state.live.send(message);
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for InMemoryBroker {
    async fn consume(
        &self,
        topic: &str,
        _group: &str,
        shutdown: CancellationToken,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()> {
        // Snapshot history and subscribe under one lock so no message is
        // missed or seen twice between replay and live delivery.
        let (backlog, mut live) = {
            let mut topics = self.topics.lock().expect("broker lock poisoned");
            let state = topics.entry(topic.to_string()).or_insert_with(TopicState::new);
            (state.history.clone(), state.live.subscribe())
        };

        for (_, payload) in &backlog {
            if shutdown.is_cancelled() {
                return Ok(());
            }
            if let Err(e) = handler.handle(payload).await {
                tracing::error!(topic, error = %e, "error handling message");
            }
        }

        loop {
            tokio::select! {
                () = shutdown.cancelled() => return Ok(()),
                received = live.recv() => match received {
                    Ok((_, payload)) => {
                        if let Err(e) = handler.handle(&payload).await {
                            tracing::error!(topic, error = %e, "error handling message");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(topic, skipped, "in-memory consumer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                },
            }
        }
    }
}
