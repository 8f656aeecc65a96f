use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::{CreditDecision, ItemRequest, OrderStatus, PaymentMethod};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================
//
// Timestamps are supplied by the engine's clock so the aggregate stays a pure
// function of its events and the command.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    PlaceOrder {
        order_id: Uuid,
        customer_id: Uuid,
        shop_id: Uuid,
        items: Vec<ItemRequest>,
        shipping_address: String,
        phone_number: String,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
        /// Client-side total, checked against the computed one when present
        expected_total: Option<Decimal>,
        at: DateTime<Utc>,
    },
    TransitionStatus {
        target: OrderStatus,
        note: Option<String>,
        at: DateTime<Utc>,
    },
    DecideCredit {
        decision: CreditDecision,
        note: Option<String>,
        credit_term: Duration,
        at: DateTime<Utc>,
    },
    MarkCreditPaid {
        at: DateTime<Utc>,
    },
}
