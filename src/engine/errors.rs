use uuid::Uuid;

use crate::domain::order::OrderError;
use crate::domain::stock::StockError;
use crate::event_sourcing::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Engine Errors - what callers of the lifecycle engine can observe
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(OrderError),

    #[error("Item unavailable: product {product_id} has {available} left, {requested} requested")]
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Invalid transition: {0}")]
    InvalidTransition(OrderError),

    #[error("Invalid stock level: {0}")]
    InvalidStockLevel(StockError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Concurrent modification of order {order_id}, retry the operation")]
    ConcurrencyConflict { order_id: Uuid },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    /// Stable label for metrics and API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::InsufficientStock { .. } => "insufficient_stock",
            EngineError::InvalidTransition(_) => "invalid_transition",
            EngineError::InvalidStockLevel(_) => "validation",
            EngineError::NotFound { .. } => "not_found",
            EngineError::ConcurrencyConflict { .. } => "concurrency_conflict",
            EngineError::Storage(_) => "storage",
        }
    }

    pub fn order_not_found(id: Uuid) -> Self {
        EngineError::NotFound { entity: "order", id }
    }
}

impl IsTransient for EngineError {
    fn is_transient(&self) -> bool {
        matches!(self, EngineError::ConcurrencyConflict { .. })
    }
}

impl From<OrderError> for EngineError {
    fn from(error: OrderError) -> Self {
        match error {
            e if e.is_validation() => EngineError::Validation(e),
            // A stream that does not start with a placement is corrupt
            OrderError::NotInitialized => {
                EngineError::Storage("order stream does not start with a placement".to_string())
            }
            e => EngineError::InvalidTransition(e),
        }
    }
}

impl From<StockError> for EngineError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::UnknownProduct(id) => EngineError::NotFound { entity: "product", id },
            StockError::InsufficientStock { product_id, requested, available } => {
                EngineError::InsufficientStock { product_id, requested, available }
            }
            e @ (StockError::Overflow { .. } | StockError::AboveCapacity { .. }) => {
                EngineError::InvalidStockLevel(e)
            }
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ConcurrencyConflict { aggregate_id, .. } => {
                EngineError::ConcurrencyConflict { order_id: aggregate_id }
            }
            e => EngineError::Storage(e.to_string()),
        }
    }
}
