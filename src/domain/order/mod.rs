// ============================================================================
// Order Domain - Business Logic for Order Aggregate
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderItem, OrderStatus, CreditStatus, CreditAccount)
// - Events (OrderPlaced, OrderCancelled, CreditApproved, etc.)
// - Commands (PlaceOrder, TransitionStatus, DecideCredit, MarkCreditPaid)
// - Errors (OrderError enum)
// - Aggregate (OrderAggregate with the two state machines)
// - History (audit trail read off the event stream)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod history;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use history::*;
