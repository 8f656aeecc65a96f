//! Order & credit lifecycle engine: stock reservation, order status machine,
//! credit sub-workflow and an append-only history, behind one entry point.

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod event_sourcing;
pub mod metrics;
pub mod utils;
