// ============================================================================
// Stock Domain - Available Quantity per Product
// ============================================================================
//
// Stock is not event-sourced: the ledger holds the live available quantity
// per product and guards each product with its own lock, so reservations on
// different products never contend.
//
// ============================================================================

pub mod errors;
pub mod ledger;

pub use errors::StockError;
pub use ledger::{Reservation, StockLedger};
