// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - order: event-sourced order aggregate with its credit sub-workflow and
//   the history ledger projected from its event stream
// - stock: per-product available quantities and reservations
//
// ============================================================================

pub mod order;
pub mod stock;
