use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EventId, EventRecord, EventStoreError, NewEvent, Result, StreamId, StreamType, Version,
    store::{AppendOptions, EventStore, validate_dense},
};

/// PostgreSQL-backed event store implementation.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<EventRecord> {
        let stream_type: String = row.try_get("stream_type")?;
        let stream_type = StreamType::parse(&stream_type).map_err(|e| {
            EventStoreError::CorruptStream {
                stream_id: StreamId::new(row.try_get::<String, _>("stream_id").unwrap_or_default()),
                detail: e.to_string(),
            }
        })?;

        Ok(EventRecord {
            id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            stream_id: StreamId::new(row.try_get::<String, _>("stream_id")?),
            stream_type,
            version: Version::new(row.try_get("version")?),
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(
        &self,
        stream_id: &StreamId,
        stream_type: StreamType,
        events: Vec<NewEvent>,
        options: AppendOptions,
    ) -> Result<Version> {
        if events.is_empty() {
            return self.current_version(stream_id).await;
        }

        let mut tx = self.pool.begin().await?;

        // Read the current version inside the transaction so the check and
        // the inserts form one atomic unit.
        let current: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM events WHERE stream_id = $1")
                .bind(stream_id.as_str())
                .fetch_one(&mut *tx)
                .await?;
        let current = Version::new(current);

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected,
                actual: current,
            });
        }

        let now = Utc::now();
        let mut version = current;

        for event in &events {
            version = version.next();

            sqlx::query(
                r#"
                INSERT INTO events (id, stream_id, stream_type, version, event_type, payload, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(EventId::new().as_uuid())
            .bind(stream_id.as_str())
            .bind(stream_type.as_str())
            .bind(version.as_i64())
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // Two writers can pass the version check concurrently; the
                // unique constraint turns the race into a conflict error.
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("events_stream_id_version_key")
                {
                    return EventStoreError::ConcurrencyConflict {
                        stream_id: stream_id.clone(),
                        expected: options.expected_version.unwrap_or(current),
                        actual: version,
                    };
                }
                EventStoreError::Database(e)
            })?;
        }

        tx.commit().await?;
        Ok(version)
    }

    async fn load(&self, stream_id: &StreamId) -> Result<Vec<EventRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, stream_id, stream_type, version, event_type, payload, created_at
            FROM events
            WHERE stream_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(stream_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let records: Vec<EventRecord> = rows
            .into_iter()
            .map(Self::row_to_record)
            .collect::<Result<_>>()?;

        validate_dense(stream_id, &records)?;
        Ok(records)
    }

    async fn current_version(&self, stream_id: &StreamId) -> Result<Version> {
        let version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM events WHERE stream_id = $1")
                .bind(stream_id.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(Version::new(version))
    }
}
