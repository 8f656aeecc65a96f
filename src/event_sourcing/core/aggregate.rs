use uuid::Uuid;
use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Commands are validated before emitting events
// 3. Events represent facts that have already happened
// 4. Aggregates enforce business invariants
//
// ============================================================================

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Handle a command that starts a new stream (no prior state)
    fn initialize(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Create new aggregate from first event. The result is at version 1.
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state. Bumps the version by one.
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command against current state and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Current version (sequence number of the last applied event)
    fn version(&self) -> i64;

    /// Rebuild from a freshly created stream's events, without envelopes
    fn from_new_events(events: &[Self::Event]) -> Result<Option<Self>, Self::Error> {
        let Some((first, rest)) = events.split_first() else {
            return Ok(None);
        };

        let mut aggregate = Self::apply_first_event(first)?;
        for event in rest {
            aggregate.apply_event(event)?;
        }

        Ok(Some(aggregate))
    }

    /// Load aggregate from event history. `None` when the stream is empty.
    fn load_from_events(events: &[EventEnvelope<Self::Event>]) -> Result<Option<Self>, Self::Error> {
        let Some((first, rest)) = events.split_first() else {
            return Ok(None);
        };

        let mut aggregate = Self::apply_first_event(&first.event_data)?;
        for envelope in rest {
            aggregate.apply_event(&envelope.event_data)?;
        }

        Ok(Some(aggregate))
    }
}
