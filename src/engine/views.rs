use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{
    CreditStatus, HistoryEntry, OrderAggregate, OrderItem, OrderStatus, PaymentMethod,
};

// ============================================================================
// Read Models
// ============================================================================

/// Who is reading, and therefore which orders they may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Customer { customer_id: Uuid },
    ShopOwner { owner_id: Uuid, shop_ids: Vec<Uuid> },
    Admin { admin_id: Uuid },
}

impl Viewer {
    pub fn actor_id(&self) -> Uuid {
        match self {
            Viewer::Customer { customer_id } => *customer_id,
            Viewer::ShopOwner { owner_id, .. } => *owner_id,
            Viewer::Admin { admin_id } => *admin_id,
        }
    }

    pub fn can_view(&self, order: &OrderAggregate) -> bool {
        match self {
            Viewer::Customer { customer_id } => order.customer_id == *customer_id,
            Viewer::ShopOwner { shop_ids, .. } => shop_ids.contains(&order.shop_id),
            Viewer::Admin { .. } => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    #[default]
    All,
    CreditOnly,
    ExcludeCredit,
}

/// Listing filter; every criterion left at its default matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub credit_status: Option<CreditStatus>,
    pub kind: OrderKind,
    pub overdue_only: bool,
    /// Approved credit falling due within the configured window
    pub due_soon_only: bool,
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderAggregate, now: DateTime<Utc>, due_soon_window: Duration) -> bool {
        if self.status.is_some_and(|status| status != order.status) {
            return false;
        }
        if self.credit_status.is_some() && self.credit_status != order.credit_status() {
            return false;
        }

        let kind_matches = match self.kind {
            OrderKind::All => true,
            OrderKind::CreditOnly => order.is_credit_order(),
            OrderKind::ExcludeCredit => !order.is_credit_order(),
        };
        if !kind_matches {
            return false;
        }

        if self.overdue_only && !order.is_overdue(now) {
            return false;
        }
        if self.due_soon_only
            && !order
                .credit
                .as_ref()
                .is_some_and(|credit| credit.is_due_within(now, due_soon_window))
        {
            return false;
        }

        true
    }
}

/// Order projection returned by every engine operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub shop_id: Uuid,
    pub status: OrderStatus,
    pub credit_status: Option<CreditStatus>,
    pub payment_due_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub items: Vec<OrderItem>,
    pub total_price: Decimal,
    pub shipping_address: String,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub cancelled_reason: Option<String>,
    pub status_history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl OrderView {
    pub fn project(order: &OrderAggregate, history: Vec<HistoryEntry>, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            shop_id: order.shop_id,
            status: order.status,
            credit_status: order.credit_status(),
            payment_due_date: order.payment_due_date(),
            is_overdue: order.is_overdue(now),
            items: order.items.clone(),
            total_price: order.total_price,
            shipping_address: order.shipping_address.clone(),
            phone_number: order.phone_number.clone(),
            payment_method: order.payment_method,
            payment_reference: order.payment_reference.clone(),
            cancelled_reason: order.cancelled_reason.clone(),
            status_history: history,
            created_at: order.created_at,
            updated_at: order.updated_at,
            version: order.version,
        }
    }
}

// ============================================================================
// Credit Reporting
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBucket {
    pub count: u64,
    pub amount: Decimal,
}

impl CreditBucket {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.amount = self.amount.saturating_add(amount);
    }
}

/// Counts and amounts per credit state. `overdue` overlaps `unpaid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    pub total: CreditBucket,
    pub paid: CreditBucket,
    pub unpaid: CreditBucket,
    pub pending: CreditBucket,
    pub rejected: CreditBucket,
    pub overdue: CreditBucket,
}

impl CreditSummary {
    pub fn add(&mut self, order: &OrderAggregate, now: DateTime<Utc>) {
        let Some(status) = order.credit_status() else {
            return;
        };

        let amount = order.total_price;
        self.total.add(amount);
        match status {
            CreditStatus::Requested => self.pending.add(amount),
            CreditStatus::Approved => self.unpaid.add(amount),
            CreditStatus::Paid => self.paid.add(amount),
            CreditStatus::Rejected => self.rejected.add(amount),
        }
        if order.is_overdue(now) {
            self.overdue.add(amount);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCredit {
    pub customer_id: Uuid,
    pub order_count: u64,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub unpaid_amount: Decimal,
    pub overdue_amount: Decimal,
}

impl CustomerCredit {
    pub fn new(customer_id: Uuid) -> Self {
        Self {
            customer_id,
            order_count: 0,
            total_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            unpaid_amount: Decimal::ZERO,
            overdue_amount: Decimal::ZERO,
        }
    }

    pub fn add(&mut self, order: &OrderAggregate, now: DateTime<Utc>) {
        let Some(status) = order.credit_status() else {
            return;
        };

        self.order_count += 1;
        let amount = order.total_price;
        self.total_amount = self.total_amount.saturating_add(amount);
        match status {
            CreditStatus::Paid => self.paid_amount = self.paid_amount.saturating_add(amount),
            CreditStatus::Approved => self.unpaid_amount = self.unpaid_amount.saturating_add(amount),
            CreditStatus::Requested | CreditStatus::Rejected => {}
        }
        if order.is_overdue(now) {
            self.overdue_amount = self.overdue_amount.saturating_add(amount);
        }
    }
}
