use async_trait::async_trait;

use crate::{EventRecord, EventStoreError, NewEvent, Result, StreamId, StreamType, Version};

/// Options for appending events to a stream.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected current version of the stream for optimistic concurrency.
    /// `None` bypasses the check (blind append); new events are still
    /// numbered from the current version.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check (blind append).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting an empty stream.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync) and must treat
/// an append as a single atomic unit: either every event in the call is
/// written, or none are.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to a stream.
    ///
    /// When `options.expected_version` is set and the stream's current
    /// version differs, the append fails with `ConcurrencyConflict` and
    /// writes nothing. New events are numbered `current+1 ..= current+n`.
    ///
    /// Returns the version assigned to the last event, or the current
    /// version when `events` is empty.
    async fn append(
        &self,
        stream_id: &StreamId,
        stream_type: StreamType,
        events: Vec<NewEvent>,
        options: AppendOptions,
    ) -> Result<Version>;

    /// Loads all events of a stream in ascending version order.
    ///
    /// The result is guaranteed to be a dense prefix `1..=N`; a gap or
    /// duplicate fails with `CorruptStream`.
    async fn load(&self, stream_id: &StreamId) -> Result<Vec<EventRecord>>;

    /// Returns the current (highest) version of a stream, 0 when empty.
    async fn current_version(&self, stream_id: &StreamId) -> Result<Version>;
}

/// Verifies that loaded records form a dense `1..=N` version prefix.
pub(crate) fn validate_dense(stream_id: &StreamId, records: &[EventRecord]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        let expected = Version::new(i as i64 + 1);
        if record.version != expected {
            return Err(EventStoreError::CorruptStream {
                stream_id: stream_id.clone(),
                detail: format!("expected version {expected} at offset {i}, found {}", record.version),
            });
        }
    }
    Ok(())
}
