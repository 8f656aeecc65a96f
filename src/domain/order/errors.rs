use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::{CreditStatus, OrderStatus};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: Uuid, quantity: i32 },

    #[error("Negative unit price {unit_price} for product {product_id}")]
    NegativePrice { product_id: Uuid, unit_price: Decimal },

    #[error("Total price mismatch: client sent {expected}, items sum to {computed}")]
    TotalMismatch { expected: Decimal, computed: Decimal },

    #[error("Order amount overflows at product {product_id}")]
    AmountOverflow { product_id: Uuid },

    #[error("Card orders require a payment reference")]
    MissingPaymentReference,

    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Credit order cannot move to {to} while credit is {credit}")]
    CreditNotGranted { to: OrderStatus, credit: CreditStatus },

    #[error("Order does not use credit")]
    NotCreditOrder,

    #[error("Cannot {action} credit in status {from}")]
    InvalidCreditTransition { from: CreditStatus, action: &'static str },

    #[error("Cannot decide credit on an order in status {0}")]
    CreditDecisionOnClosedOrder(OrderStatus),

    #[error("Order is already placed")]
    AlreadyPlaced,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl OrderError {
    /// Malformed or inconsistent input, as opposed to an illegal state change
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::EmptyItems
                | OrderError::InvalidQuantity { .. }
                | OrderError::NegativePrice { .. }
                | OrderError::TotalMismatch { .. }
                | OrderError::AmountOverflow { .. }
                | OrderError::MissingPaymentReference
        )
    }
}
