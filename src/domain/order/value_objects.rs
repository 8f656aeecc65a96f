use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Order fulfilment status.
///
/// `pending → processing → shipped → delivered`, with `cancelled` reachable
/// from `pending` and `processing` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The only legal edges of the fulfilment state machine
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Processing, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deferred-payment status, present only on credit orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Requested,
    Approved,
    Paid,
    Rejected,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Requested => "requested",
            CreditStatus::Approved => "approved",
            CreditStatus::Paid => "paid",
            CreditStatus::Rejected => "rejected",
        }
    }

    /// Approved or already settled
    pub fn is_granted(&self) -> bool {
        matches!(self, CreditStatus::Approved | CreditStatus::Paid)
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Credit,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Card => "card",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditDecision {
    Approve,
    Reject,
}

/// Line item as requested by the client, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Validated line item with its computed subtotal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl OrderItem {
    /// `None` when the subtotal does not fit in a `Decimal`
    pub fn new(product_id: Uuid, quantity: u32, unit_price: Decimal) -> Option<Self> {
        let subtotal = unit_price.checked_mul(Decimal::from(quantity))?;
        Some(Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// Credit sub-workflow state attached to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAccount {
    pub status: CreditStatus,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub payment_due_date: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub decision_note: Option<String>,
}

impl CreditAccount {
    pub fn requested(at: DateTime<Utc>) -> Self {
        Self {
            status: CreditStatus::Requested,
            requested_at: at,
            decided_at: None,
            payment_due_date: None,
            paid_at: None,
            decision_note: None,
        }
    }

    /// Derived, never stored: approved and past its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == CreditStatus::Approved
            && self.payment_due_date.is_some_and(|due| now > due)
    }

    /// Approved and falling due within `window` from `now`
    pub fn is_due_within(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == CreditStatus::Approved
            && self
                .payment_due_date
                .is_some_and(|due| due >= now && due <= now + window)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
