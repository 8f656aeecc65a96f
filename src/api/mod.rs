// ============================================================================
// HTTP API - actix-web surface over the lifecycle engine
// ============================================================================

pub mod dto;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::ApiError;
pub use extractors::{ActorContext, Role};
pub use routes::configure_routes;
pub use state::AppState;
