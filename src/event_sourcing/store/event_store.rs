use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::marker::PhantomData;
use uuid::Uuid;

use crate::event_sourcing::core::{DomainEvent, EventEnvelope, serialize_event, deserialize_event};

// ============================================================================
// Event Store - Repository for Events
// ============================================================================
//
// Responsibilities:
// 1. Append events to an aggregate's stream (append-only)
// 2. Load event history for aggregates
// 3. Enforce optimistic concurrency control on the stream version
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on aggregate {aggregate_id}: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Cannot append empty event list")]
    EmptyAppend,

    #[error("Event sequence gap on aggregate {aggregate_id}: expected {expected}, got {actual}")]
    SequenceGap {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence seam for event streams keyed by aggregate id.
#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Append events to the stream. Returns the new version number after appending.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError>;

    /// Load all events for an aggregate, ordered by sequence number
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError>;

    /// 0 for an aggregate with no events
    async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError>;

    /// Every aggregate id with at least one event, in stream creation order
    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError>;
}

// ============================================================================
// In-Memory Backend
// ============================================================================

/// Row shape as it would be persisted: the payload is kept as JSON text.
#[derive(Debug, Clone)]
struct StoredEvent {
    event_id: Uuid,
    sequence_number: i64,
    event_type: String,
    event_version: i32,
    event_data: String,
    correlation_id: Uuid,
    actor_id: Option<Uuid>,
    timestamp: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

#[derive(Default)]
struct Streams {
    by_aggregate: HashMap<Uuid, Vec<StoredEvent>>,
    creation_order: Vec<Uuid>,
}

/// Thread-safe in-memory event store. A single write lock makes each append
/// atomic; readers see a consistent snapshot of every stream.
pub struct InMemoryEventStore<E: DomainEvent> {
    streams: RwLock<Streams>,
    aggregate_type_name: String,
    _phantom: PhantomData<fn() -> E>,
}

impl<E: DomainEvent> InMemoryEventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            streams: RwLock::new(Streams::default()),
            aggregate_type_name: aggregate_type_name.to_string(),
            _phantom: PhantomData,
        }
    }

    fn decode(aggregate_id: Uuid, row: &StoredEvent) -> Result<EventEnvelope<E>, StoreError> {
        let event_data: E = deserialize_event(&row.event_data)?;

        Ok(EventEnvelope {
            event_id: row.event_id,
            aggregate_id,
            sequence_number: row.sequence_number,
            event_type: row.event_type.clone(),
            event_version: row.event_version,
            event_data,
            correlation_id: row.correlation_id,
            actor_id: row.actor_id,
            timestamp: row.timestamp,
            metadata: row.metadata.clone(),
        })
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InMemoryEventStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyAppend);
        }

        // Serialize outside the lock; nothing is written unless every row encodes
        let mut rows = Vec::with_capacity(events.len());
        let mut next = expected_version;
        for envelope in &events {
            next += 1;
            if envelope.sequence_number != next {
                return Err(StoreError::SequenceGap {
                    aggregate_id,
                    expected: next,
                    actual: envelope.sequence_number,
                });
            }

            rows.push(StoredEvent {
                event_id: envelope.event_id,
                sequence_number: envelope.sequence_number,
                event_type: envelope.event_type.clone(),
                event_version: envelope.event_version,
                event_data: serialize_event(&envelope.event_data)?,
                correlation_id: envelope.correlation_id,
                actor_id: envelope.actor_id,
                timestamp: envelope.timestamp,
                metadata: envelope.metadata.clone(),
            });
        }

        let mut streams = self.streams.write();

        // Check optimistic concurrency
        let current_version = streams
            .by_aggregate
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |row| row.sequence_number);
        if current_version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        if current_version == 0 {
            streams.creation_order.push(aggregate_id);
        }
        streams.by_aggregate.entry(aggregate_id).or_default().extend(rows);

        tracing::debug!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = next,
            event_count = events.len(),
            "Appended events to event store"
        );

        Ok(next)
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let streams = self.streams.read();

        let Some(stream) = streams.by_aggregate.get(&aggregate_id) else {
            return Ok(Vec::new());
        };

        stream.iter().map(|row| Self::decode(aggregate_id, row)).collect()
    }

    async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        let streams = self.streams.read();
        Ok(streams
            .by_aggregate
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |row| row.sequence_number))
    }

    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.streams.read().creation_order.clone())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    enum CounterEvent {
        Opened,
        Incremented(u32),
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                CounterEvent::Opened => "CounterOpened",
                CounterEvent::Incremented(_) => "CounterIncremented",
            }
        }
    }

    fn envelope(aggregate_id: Uuid, seq: i64, event: CounterEvent) -> EventEnvelope<CounterEvent> {
        EventEnvelope::new(aggregate_id, seq, event, Uuid::new_v4(), Utc::now())
    }

    #[tokio::test]
    async fn test_append_and_load_roundtrip() {
        let store = InMemoryEventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();
        let actor = Uuid::new_v4();

        let version = store
            .append_events(
                id,
                0,
                vec![
                    envelope(id, 1, CounterEvent::Opened).with_actor(actor),
                    envelope(id, 2, CounterEvent::Incremented(3)),
                ],
            )
            .await
            .unwrap();
        assert_eq!(version, 2);

        let events = store.load_events(id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "CounterOpened");
        assert_eq!(events[0].actor_id, Some(actor));
        assert_eq!(events[1].event_data, CounterEvent::Incremented(3));
        assert_eq!(store.get_current_version(id).await.unwrap(), 2);
        assert_eq!(store.aggregate_ids().await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_rejected() {
        let store = InMemoryEventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();

        store.append_events(id, 0, vec![envelope(id, 1, CounterEvent::Opened)]).await.unwrap();

        let result = store
            .append_events(id, 0, vec![envelope(id, 1, CounterEvent::Opened)])
            .await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { expected: 0, actual: 1, .. })
        ));

        // Nothing from the rejected append is visible
        assert_eq!(store.load_events(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sequence_gap_is_rejected() {
        let store = InMemoryEventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();

        let result = store
            .append_events(id, 0, vec![envelope(id, 2, CounterEvent::Opened)])
            .await;
        assert!(matches!(result, Err(StoreError::SequenceGap { expected: 1, actual: 2, .. })));
        assert_eq!(store.get_current_version(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_append_is_rejected() {
        let store = InMemoryEventStore::<CounterEvent>::new("Counter");
        let result = store.append_events(Uuid::new_v4(), 0, vec![]).await;
        assert!(matches!(result, Err(StoreError::EmptyAppend)));
    }

    #[tokio::test]
    async fn test_unknown_aggregate_has_no_events() {
        let store = InMemoryEventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();
        assert!(store.load_events(id).await.unwrap().is_empty());
        assert_eq!(store.get_current_version(id).await.unwrap(), 0);
        assert!(store.aggregate_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_ids_keep_creation_order() {
        let store = InMemoryEventStore::<CounterEvent>::new("Counter");
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.append_events(first, 0, vec![envelope(first, 1, CounterEvent::Opened)]).await.unwrap();
        store.append_events(second, 0, vec![envelope(second, 1, CounterEvent::Opened)]).await.unwrap();
        store
            .append_events(first, 1, vec![envelope(first, 2, CounterEvent::Incremented(1))])
            .await
            .unwrap();

        assert_eq!(store.aggregate_ids().await.unwrap(), vec![first, second]);
    }
}
