use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::Message;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio_util::sync::CancellationToken;

use crate::bus::{EventPublisher, EventSubscriber, MessageHandler};
use crate::{MessagingError, Result};

/// Kafka-backed broker client.
///
/// One shared producer serves all publishes; each `consume` call builds
/// its own consumer so every (topic, group) pair owns one stream.
#[derive(Clone)]
pub struct KafkaBroker {
    brokers: String,
    producer: FutureProducer,
}

impl KafkaBroker {
    /// Creates a broker client for a comma-separated broker list.
    pub fn new(brokers: impl Into<String>) -> Result<Self> {
        let brokers = brokers.into();
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { brokers, producer })
    }

    fn consumer(&self, group: &str) -> Result<StreamConsumer> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;
        Ok(consumer)
    }
}

#[async_trait]
impl EventPublisher for KafkaBroker {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(&payload);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| MessagingError::Kafka(e))?;

        metrics::counter!("broker_messages_published", "topic" => topic.to_string()).increment(1);
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for KafkaBroker {
    async fn consume(
        &self,
        topic: &str,
        group: &str,
        shutdown: CancellationToken,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()> {
        let consumer = self.consumer(group)?;
        consumer.subscribe(&[topic])?;

        tracing::info!(topic, group, "consumer started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!(topic, group, "consumer shutting down");
                    return Ok(());
                }
                result = consumer.recv() => {
                    let message = match result {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::error!(topic, group, error = %e, "error reading message");
                            continue;
                        }
                    };

                    let payload = message.payload().unwrap_or_default();
                    match handler.handle(payload).await {
                        Ok(()) => {
                            metrics::counter!("broker_messages_consumed", "topic" => topic.to_string())
                                .increment(1);
                            // Commit only after success so failures are redelivered.
                            if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                                tracing::error!(topic, group, error = %e, "failed to commit offset");
                            }
                        }
                        Err(e) => {
                            tracing::error!(topic, group, error = %e, "error handling message");
                        }
                    }
                }
            }
        }
    }
}
