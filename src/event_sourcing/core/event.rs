use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with the metadata needed to audit them: who caused the
// change, when, and which logical operation it belonged to.
//
// ============================================================================

/// Generic Event Envelope - wraps any domain event with metadata
///
/// Type Parameter:
/// - `E`: The domain event type (must implement DomainEvent trait)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    // Event Type Information
    pub event_type: String,
    pub event_version: i32,

    // Event Payload
    pub event_data: E,

    // Groups every event written by one engine operation
    pub correlation_id: Uuid,

    // Actor Information
    pub actor_id: Option<Uuid>,

    // Timing
    pub timestamp: DateTime<Utc>,

    // Additional Metadata
    pub metadata: HashMap<String, String>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_data: E,
        correlation_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_version: event_data.event_version(),
            event_data,
            correlation_id,
            actor_id: None,
            timestamp,
            metadata: HashMap::new(),
        }
    }

    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All domain events must implement this trait to be used with the event store.
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable name stored alongside the payload
    fn event_type(&self) -> &'static str;

    fn event_version(&self) -> i32 {
        1
    }
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn deserialize_event<E: DeserializeOwned>(json: &str) -> serde_json::Result<E> {
    serde_json::from_str(json)
}

// ============================================================================
// Tests
// ============================================================================
