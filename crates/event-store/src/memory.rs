use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    EventId, EventRecord, EventStoreError, NewEvent, Result, StreamId, StreamType, Version,
    store::{AppendOptions, EventStore, validate_dense},
};

/// In-memory event store implementation for testing.
///
/// Stores streams in a map guarded by a single lock, providing the same
/// append/load semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<StreamId, Vec<EventRecord>>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events across all streams.
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }

    /// Clears all streams.
    pub async fn clear(&self) {
        self.streams.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        stream_id: &StreamId,
        stream_type: StreamType,
        events: Vec<NewEvent>,
        options: AppendOptions,
    ) -> Result<Version> {
        let mut streams = self.streams.write().await;
        let stream = streams.entry(stream_id.clone()).or_default();

        let current = stream
            .last()
            .map(|r| r.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected,
                actual: current,
            });
        }

        if events.is_empty() {
            return Ok(current);
        }

        let now = Utc::now();
        let mut version = current;

        for event in events {
            version = version.next();
            stream.push(EventRecord {
                id: EventId::new(),
                stream_id: stream_id.clone(),
                stream_type,
                version,
                event_type: event.event_type,
                payload: event.payload,
                created_at: now,
            });
        }

        Ok(version)
    }

    async fn load(&self, stream_id: &StreamId) -> Result<Vec<EventRecord>> {
        let streams = self.streams.read().await;
        let records = streams.get(stream_id).cloned().unwrap_or_default();
        validate_dense(stream_id, &records)?;
        Ok(records)
    }

    async fn current_version(&self, stream_id: &StreamId) -> Result<Version> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(stream_id)
            .and_then(|s| s.last())
            .map(|r| r.version)
            .unwrap_or(Version::initial()))
    }
}
