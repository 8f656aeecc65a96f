use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_sourcing::DomainEvent;
use super::history::{HistoryDomain, TrackedState};
use super::value_objects::{CreditStatus, OrderItem, OrderStatus, PaymentMethod};

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================
//
// Every event is exactly one accepted transition on either the order axis or
// the credit axis, so the event stream doubles as the history ledger.
//
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    ProcessingStarted(OrderProcessingStarted),
    Shipped(OrderShipped),
    Delivered(OrderDelivered),
    Cancelled(OrderCancelled),
    CreditRequested(CreditRequested),
    CreditApproved(CreditApproved),
    CreditRejected(CreditRejected),
    CreditPaid(CreditPaid),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::ProcessingStarted(_) => "OrderProcessingStarted",
            OrderEvent::Shipped(_) => "OrderShipped",
            OrderEvent::Delivered(_) => "OrderDelivered",
            OrderEvent::Cancelled(_) => "OrderCancelled",
            OrderEvent::CreditRequested(_) => "CreditRequested",
            OrderEvent::CreditApproved(_) => "CreditApproved",
            OrderEvent::CreditRejected(_) => "CreditRejected",
            OrderEvent::CreditPaid(_) => "CreditPaid",
        }
    }
}

impl OrderEvent {
    /// Axis and target state of the transition this event records
    pub fn target(&self) -> (HistoryDomain, TrackedState) {
        match self {
            OrderEvent::Placed(_) => (HistoryDomain::Order, OrderStatus::Pending.into()),
            OrderEvent::ProcessingStarted(_) => (HistoryDomain::Order, OrderStatus::Processing.into()),
            OrderEvent::Shipped(_) => (HistoryDomain::Order, OrderStatus::Shipped.into()),
            OrderEvent::Delivered(_) => (HistoryDomain::Order, OrderStatus::Delivered.into()),
            OrderEvent::Cancelled(_) => (HistoryDomain::Order, OrderStatus::Cancelled.into()),
            OrderEvent::CreditRequested(_) => (HistoryDomain::Credit, CreditStatus::Requested.into()),
            OrderEvent::CreditApproved(_) => (HistoryDomain::Credit, CreditStatus::Approved.into()),
            OrderEvent::CreditRejected(_) => (HistoryDomain::Credit, CreditStatus::Rejected.into()),
            OrderEvent::CreditPaid(_) => (HistoryDomain::Credit, CreditStatus::Paid.into()),
        }
    }

    /// When the transition took effect
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Placed(e) => e.placed_at,
            OrderEvent::ProcessingStarted(e) => e.started_at,
            OrderEvent::Shipped(e) => e.shipped_at,
            OrderEvent::Delivered(e) => e.delivered_at,
            OrderEvent::Cancelled(e) => e.cancelled_at,
            OrderEvent::CreditRequested(e) => e.requested_at,
            OrderEvent::CreditApproved(e) => e.approved_at,
            OrderEvent::CreditRejected(e) => e.rejected_at,
            OrderEvent::CreditPaid(e) => e.paid_at,
        }
    }

    /// Free-text note carried by the transition, if any
    pub fn note(&self) -> Option<&str> {
        match self {
            OrderEvent::ProcessingStarted(e) => e.note.as_deref(),
            OrderEvent::Shipped(e) => e.note.as_deref(),
            OrderEvent::Delivered(e) => e.note.as_deref(),
            OrderEvent::Cancelled(e) => e.reason.as_deref(),
            OrderEvent::CreditApproved(e) => e.note.as_deref(),
            OrderEvent::CreditRejected(e) => e.note.as_deref(),
            OrderEvent::Placed(_) | OrderEvent::CreditRequested(_) | OrderEvent::CreditPaid(_) => None,
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Placed - Initial event in order lifecycle, stock already reserved
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub shop_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_price: Decimal,
    pub shipping_address: String,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub placed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderProcessingStarted {
    pub started_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderShipped {
    pub shipped_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderDelivered {
    pub delivered_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Order Cancelled - reserved stock is released exactly once, on this event
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCancelled {
    pub cancelled_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreditRequested {
    pub requested_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreditApproved {
    pub approved_at: DateTime<Utc>,
    pub payment_due_date: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreditRejected {
    pub rejected_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreditPaid {
    pub paid_at: DateTime<Utc>,
}
