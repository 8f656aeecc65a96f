// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================

pub mod event_store;

pub use event_store::{EventStore, InMemoryEventStore, StoreError};
