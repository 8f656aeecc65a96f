// ============================================================================
// Lifecycle Engine
// ============================================================================
//
// Orchestrates the order aggregate, the stock ledger and the event store:
// - lifecycle: mutations, each all-or-nothing under a per-order lock
// - queries: role-scoped reads and credit reporting
// - views: read models returned to callers
//
// ============================================================================

mod clock;
mod errors;
mod lifecycle;
mod locks;
mod queries;
mod views;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, SystemClock};
pub use errors::EngineError;
pub use lifecycle::{EngineSettings, LifecycleEngine, NewOrder};
pub use views::{
    CreditBucket, CreditSummary, CustomerCredit, OrderFilter, OrderKind, OrderView, Viewer,
};
