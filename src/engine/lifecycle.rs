use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::order::{
    history_from_events, CreditDecision, HistoryEntry, ItemRequest, OrderAggregate,
    OrderCommand, OrderEvent, OrderStatus, PaymentMethod,
};
use crate::domain::stock::{StockError, StockLedger};
use crate::event_sourcing::{Aggregate, EventEnvelope, EventStore, InMemoryEventStore};
use crate::metrics::Metrics;

use super::clock::{Clock, SystemClock};
use super::errors::EngineError;
use super::locks::KeyedLocks;
use super::views::OrderView;

// ============================================================================
// Lifecycle Engine - single entry point for every mutation
// ============================================================================
//
// Command → per-order lock → fresh state from the event store → aggregate
// decision → stock side effects → append. An operation either appends its
// events and keeps its stock effects, or leaves both untouched.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Added to the approval time to get the payment due date
    pub credit_term: chrono::Duration,
    /// Budget for acquiring an order's lock
    pub lock_timeout: Duration,
    pub due_soon_window: chrono::Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            credit_term: chrono::Duration::days(30),
            lock_timeout: Duration::from_secs(5),
            due_soon_window: chrono::Duration::days(7),
        }
    }
}

/// Checkout request as received from the storefront
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub shop_id: Uuid,
    pub items: Vec<ItemRequest>,
    pub shipping_address: String,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    /// Client-computed total, checked when present
    pub total_price: Option<Decimal>,
}

pub struct LifecycleEngine {
    pub(super) store: Arc<dyn EventStore<OrderEvent>>,
    pub(super) stock: Arc<StockLedger>,
    order_locks: KeyedLocks,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) settings: EngineSettings,
    pub(super) metrics: Arc<Metrics>,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn EventStore<OrderEvent>>,
        stock: Arc<StockLedger>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            stock,
            order_locks: KeyedLocks::new(),
            clock,
            settings,
            metrics,
        }
    }

    /// In-memory event store, empty stock ledger, wall clock
    pub fn in_memory(settings: EngineSettings, metrics: Arc<Metrics>) -> Self {
        Self::new(
            Arc::new(InMemoryEventStore::<OrderEvent>::new("Order")),
            Arc::new(StockLedger::new()),
            Arc::new(SystemClock),
            settings,
            metrics,
        )
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ========================================================================
    // Public Operations
    // ========================================================================

    /// Validate, reserve stock for every line and record the placement (and
    /// credit request for credit orders) in one step.
    pub async fn create_order(&self, order: NewOrder, actor_id: Uuid) -> Result<OrderView, EngineError> {
        let _timer = self.metrics.start_timer("create_order");
        let result = self.place(order, actor_id).await;
        self.observe("create_order", actor_id, &result);
        result
    }

    pub async fn transition_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        actor_id: Uuid,
        note: Option<String>,
    ) -> Result<OrderView, EngineError> {
        let operation = if target == OrderStatus::Cancelled {
            "cancel_order"
        } else {
            "transition_status"
        };

        self.execute(operation, order_id, actor_id, |at| OrderCommand::TransitionStatus {
            target,
            note,
            at,
        })
        .await
    }

    /// Cancel and give the reserved stock back
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> Result<OrderView, EngineError> {
        self.transition_status(order_id, OrderStatus::Cancelled, actor_id, reason)
            .await
    }

    pub async fn decide_credit(
        &self,
        order_id: Uuid,
        decision: CreditDecision,
        actor_id: Uuid,
        note: Option<String>,
    ) -> Result<OrderView, EngineError> {
        let credit_term = self.settings.credit_term;
        self.execute("decide_credit", order_id, actor_id, |at| OrderCommand::DecideCredit {
            decision,
            note,
            credit_term,
            at,
        })
        .await
    }

    pub async fn mark_credit_paid(&self, order_id: Uuid, actor_id: Uuid) -> Result<OrderView, EngineError> {
        self.execute("mark_credit_paid", order_id, actor_id, |at| OrderCommand::MarkCreditPaid { at })
            .await
    }

    /// Seed or correct a product's available quantity
    pub fn set_stock(&self, product_id: Uuid, quantity: u32, actor_id: Uuid) -> Result<u32, EngineError> {
        if let Err(e) = self.stock.set_stock(product_id, quantity) {
            tracing::warn!(product_id = %product_id, actor_id = %actor_id, error = %e, "Stock level rejected");
            return Err(e.into());
        }
        tracing::info!(product_id = %product_id, actor_id = %actor_id, quantity, "Stock level set");
        Ok(quantity)
    }

    pub fn stock_level(&self, product_id: Uuid) -> Result<u32, EngineError> {
        Ok(self.stock.available(product_id)?)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn place(&self, order: NewOrder, actor_id: Uuid) -> Result<OrderView, EngineError> {
        let order_id = Uuid::now_v7();
        let at = self.clock.now();
        let payment_method = order.payment_method;

        let command = OrderCommand::PlaceOrder {
            order_id,
            customer_id: order.customer_id,
            shop_id: order.shop_id,
            items: order.items,
            shipping_address: order.shipping_address,
            phone_number: order.phone_number,
            payment_method,
            payment_reference: order.payment_reference,
            expected_total: order.total_price,
            at,
        };

        let events = OrderAggregate::initialize(&command)?;
        let placed = OrderAggregate::from_new_events(&events)?
            .ok_or_else(|| EngineError::Storage("placement produced no events".to_string()))?;

        let reservation = self.stock.reserve_all(&placed.reserved_lines()).map_err(|e| {
            if matches!(e, StockError::InsufficientStock { .. }) {
                self.metrics.record_stock_failure();
            }
            EngineError::from(e)
        })?;

        // The reservation is returned if the append fails
        let envelopes = Self::wrap(order_id, 0, events, actor_id, "create_order");
        self.store.append_events(order_id, 0, envelopes.clone()).await?;
        reservation.commit();

        let history = history_from_events(&envelopes);
        self.record_transitions(&history);
        self.metrics.record_order_created(payment_method.as_str());

        Ok(OrderView::project(&placed, history, at))
    }

    async fn execute<F>(
        &self,
        operation: &'static str,
        order_id: Uuid,
        actor_id: Uuid,
        build: F,
    ) -> Result<OrderView, EngineError>
    where
        F: FnOnce(DateTime<Utc>) -> OrderCommand,
    {
        let _timer = self.metrics.start_timer(operation);
        let result = self.apply_command(operation, order_id, actor_id, build).await;
        self.observe(operation, actor_id, &result);
        result
    }

    async fn apply_command<F>(
        &self,
        operation: &'static str,
        order_id: Uuid,
        actor_id: Uuid,
        build: F,
    ) -> Result<OrderView, EngineError>
    where
        F: FnOnce(DateTime<Utc>) -> OrderCommand,
    {
        let _guard = self.order_locks.acquire(order_id, self.settings.lock_timeout).await?;

        // Decide against durable state, never against what the caller saw
        let mut stream = self.store.load_events(order_id).await?;
        let current = OrderAggregate::load_from_events(&stream)?
            .ok_or_else(|| EngineError::order_not_found(order_id))?;

        let at = self.clock.now();
        let command = build(at);
        let events = current.handle_command(&command)?;

        let mut next = current.clone();
        for event in &events {
            next.apply_event(event)?;
        }

        let expected_version = current.version();
        let envelopes = Self::wrap(order_id, expected_version, events, actor_id, operation);
        self.store
            .append_events(order_id, expected_version, envelopes.clone())
            .await?;

        // Only the transition into cancelled releases, so at most once per order
        if next.status == OrderStatus::Cancelled && current.status != OrderStatus::Cancelled {
            if let Err(e) = self.stock.release_all(&next.reserved_lines()) {
                tracing::error!(order_id = %order_id, error = %e, "Failed to release stock of cancelled order");
            }
        }

        let first_new = stream.len();
        stream.extend(envelopes);
        let history = history_from_events(&stream);
        self.record_transitions(&history[first_new..]);

        Ok(OrderView::project(&next, history, at))
    }

    fn wrap(
        order_id: Uuid,
        version: i64,
        events: Vec<OrderEvent>,
        actor_id: Uuid,
        operation: &'static str,
    ) -> Vec<EventEnvelope<OrderEvent>> {
        let correlation_id = Uuid::new_v4();

        events
            .into_iter()
            .zip(version + 1..)
            .map(|(event, sequence)| {
                let at = event.occurred_at();
                EventEnvelope::new(order_id, sequence, event, correlation_id, at)
                    .with_actor(actor_id)
                    .with_metadata("operation", operation)
            })
            .collect()
    }

    fn record_transitions(&self, entries: &[HistoryEntry]) {
        for entry in entries {
            let from = entry.from.map_or("none", |state| state.as_str());
            self.metrics.record_transition(entry.domain.as_str(), from, entry.to.as_str());
        }
    }

    fn observe(&self, operation: &'static str, actor_id: Uuid, result: &Result<OrderView, EngineError>) {
        match result {
            Ok(view) => {
                tracing::info!(
                    operation,
                    order_id = %view.id,
                    actor_id = %actor_id,
                    status = %view.status,
                    credit_status = ?view.credit_status,
                    version = view.version,
                    "Operation accepted"
                );
            }
            Err(e) => {
                self.metrics.record_rejection(operation, e.kind());
                if matches!(e, EngineError::Storage(_)) {
                    tracing::error!(operation, actor_id = %actor_id, error = %e, "Operation failed");
                } else {
                    tracing::warn!(operation, actor_id = %actor_id, kind = e.kind(), error = %e, "Operation rejected");
                }
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{CreditStatus, HistoryDomain, OrderError, TrackedState};
    use crate::engine::testing::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_order_reserves_stock_and_records_history() {
        let fixture = Fixture::new();
        let product = fixture.product(5);

        let view = fixture
            .engine
            .create_order(fixture.order(vec![line(product, 2, dec!(12.50))], PaymentMethod::CashOnDelivery), fixture.customer)
            .await
            .unwrap();

        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.total_price, dec!(25.00));
        assert_eq!(view.credit_status, None);
        assert_eq!(view.status_history.len(), 1);
        assert_eq!(view.status_history[0].from, None);
        assert_eq!(view.status_history[0].actor_id, Some(fixture.customer));
        assert_eq!(fixture.engine.stock_level(product), Ok(3));
    }

    #[tokio::test]
    async fn test_credit_order_starts_requested() {
        let fixture = Fixture::new();
        let product = fixture.product(5);

        let view = fixture
            .engine
            .create_order(fixture.order(vec![line(product, 1, dec!(40))], PaymentMethod::Credit), fixture.customer)
            .await
            .unwrap();

        assert_eq!(view.credit_status, Some(CreditStatus::Requested));
        assert_eq!(view.payment_due_date, None);
        assert_eq!(view.status_history.len(), 2);
        assert_eq!(view.status_history[1].domain, HistoryDomain::Credit);
        assert_eq!(view.status_history[1].from, None);
    }

    #[tokio::test]
    async fn test_validation_failure_touches_nothing() {
        let fixture = Fixture::new();
        let product = fixture.product(5);

        let mut order = fixture.order(vec![line(product, 2, dec!(10))], PaymentMethod::CashOnDelivery);
        order.total_price = Some(dec!(15));

        let err = fixture.engine.create_order(order, fixture.customer).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(OrderError::TotalMismatch { .. })));
        assert_eq!(fixture.engine.stock_level(product), Ok(5));
        assert!(fixture.store.aggregate_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_amount_is_validation_error() {
        let fixture = Fixture::new();
        let product = fixture.product(5);

        let order = fixture.order(vec![line(product, 2, Decimal::MAX)], PaymentMethod::CashOnDelivery);
        let err = fixture.engine.create_order(order, fixture.customer).await.unwrap_err();
        assert_eq!(err, EngineError::Validation(OrderError::AmountOverflow { product_id: product }));
        assert_eq!(fixture.engine.stock_level(product), Ok(5));
        assert!(fixture.store.aggregate_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let fixture = Fixture::new();
        let unknown = Uuid::new_v4();

        let err = fixture
            .engine
            .create_order(fixture.order(vec![line(unknown, 1, dec!(1))], PaymentMethod::CashOnDelivery), fixture.customer)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound { entity: "product", id: unknown });
    }

    #[tokio::test]
    async fn test_partial_reservation_rolls_back() {
        let fixture = Fixture::new();
        let first = fixture.product(5);
        let second = fixture.product(1);

        // A competing order takes the last unit of the second product
        fixture
            .engine
            .create_order(fixture.order(vec![line(second, 1, dec!(3))], PaymentMethod::CashOnDelivery), fixture.customer)
            .await
            .unwrap();

        let err = fixture
            .engine
            .create_order(
                fixture.order(
                    vec![line(first, 2, dec!(10)), line(second, 1, dec!(3))],
                    PaymentMethod::CashOnDelivery,
                ),
                fixture.customer,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::InsufficientStock { product_id: second, requested: 1, available: 0 }
        );
        assert_eq!(fixture.engine.stock_level(first), Ok(5));
        assert_eq!(fixture.store.aggregate_ids().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_append_returns_reserved_stock() {
        let fixture = Fixture::new();
        let product = fixture.product(4);

        fixture.store.fail_next_append();
        let err = fixture
            .engine
            .create_order(fixture.order(vec![line(product, 3, dec!(1))], PaymentMethod::CashOnDelivery), fixture.customer)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ConcurrencyConflict { .. }));
        assert_eq!(fixture.engine.stock_level(product), Ok(4));
    }

    #[tokio::test]
    async fn test_failed_cancel_keeps_stock_reserved() {
        let fixture = Fixture::new();
        let product = fixture.product(4);
        let order = fixture.place(vec![line(product, 3, dec!(1))], PaymentMethod::CashOnDelivery).await;

        fixture.store.fail_next_append();
        let err = fixture.engine.cancel_order(order.id, fixture.customer, None).await.unwrap_err();
        assert!(matches!(err, EngineError::ConcurrencyConflict { .. }));
        assert_eq!(fixture.engine.stock_level(product), Ok(1));

        // Nothing was recorded, so the retry goes through
        let view = fixture.engine.cancel_order(order.id, fixture.customer, None).await.unwrap();
        assert_eq!(view.status, OrderStatus::Cancelled);
        assert_eq!(fixture.engine.stock_level(product), Ok(4));
    }

    #[tokio::test]
    async fn test_fulfilment_path_and_history() {
        let fixture = Fixture::new();
        let product = fixture.product(2);
        let order = fixture.place(vec![line(product, 1, dec!(5))], PaymentMethod::CashOnDelivery).await;

        for target in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
            fixture
                .engine
                .transition_status(order.id, target, fixture.owner, None)
                .await
                .unwrap();
        }

        let err = fixture
            .engine
            .cancel_order(order.id, fixture.owner, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));

        let history = fixture.engine.history(&fixture.admin(), order.id).await.unwrap();
        let states: Vec<_> = history.iter().map(|entry| entry.to.as_str()).collect();
        assert_eq!(states, vec!["pending", "processing", "shipped", "delivered"]);
        assert_eq!(history[3].from, Some(TrackedState::Order(OrderStatus::Shipped)));

        // Delivered orders keep their stock
        assert_eq!(fixture.engine.stock_level(product), Ok(1));
    }

    #[tokio::test]
    async fn test_rejected_attempt_adds_no_history() {
        let fixture = Fixture::new();
        let product = fixture.product(2);
        let order = fixture.place(vec![line(product, 1, dec!(5))], PaymentMethod::CashOnDelivery).await;

        let err = fixture
            .engine
            .transition_status(order.id, OrderStatus::Delivered, fixture.owner, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(OrderError::InvalidStatusTransition { .. })));

        let history = fixture.engine.history(&fixture.admin(), order.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_releases_stock_and_records_reason() {
        let fixture = Fixture::new();
        let product = fixture.product(5);
        let order = fixture.place(vec![line(product, 2, dec!(5)), line(product, 1, dec!(5))], PaymentMethod::CashOnDelivery).await;
        assert_eq!(fixture.engine.stock_level(product), Ok(2));

        let view = fixture
            .engine
            .cancel_order(order.id, fixture.customer, Some("ordered twice".to_string()))
            .await
            .unwrap();
        assert_eq!(view.status, OrderStatus::Cancelled);
        assert_eq!(view.cancelled_reason.as_deref(), Some("ordered twice"));
        assert_eq!(view.status_history.last().and_then(|e| e.note.as_deref()), Some("ordered twice"));
        assert_eq!(fixture.engine.stock_level(product), Ok(5));

        let err = fixture.engine.cancel_order(order.id, fixture.customer, None).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        assert_eq!(fixture.engine.stock_level(product), Ok(5));
    }

    #[tokio::test]
    async fn test_restock_keeps_room_for_reserved_units() {
        let fixture = Fixture::new();
        let product = fixture.product(5);
        let order = fixture.place(vec![line(product, 2, dec!(5))], PaymentMethod::CashOnDelivery).await;

        let err = fixture.engine.set_stock(product, u32::MAX, fixture.owner).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(fixture.engine.stock_level(product), Ok(3));

        fixture.engine.set_stock(product, u32::MAX - 2, fixture.owner).unwrap();
        fixture.engine.cancel_order(order.id, fixture.customer, None).await.unwrap();
        assert_eq!(fixture.engine.stock_level(product), Ok(u32::MAX));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cancels_release_once() {
        let fixture = Arc::new(Fixture::new());
        let product = fixture.product(3);
        let order_id = fixture.place(vec![line(product, 2, dec!(5))], PaymentMethod::CashOnDelivery).await.id;

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let fixture = fixture.clone();
                tokio::spawn(async move { fixture.engine.cancel_order(order_id, fixture.customer, None).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(EngineError::InvalidTransition(_)))));
        assert_eq!(fixture.engine.stock_level(product), Ok(3));

        let history = fixture.engine.history(&fixture.admin(), order_id).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_credit_approval_and_payment() {
        let fixture = Fixture::new();
        let product = fixture.product(3);
        let order = fixture.place(vec![line(product, 1, dec!(80))], PaymentMethod::Credit).await;
        let decided_at = fixture.clock.now();

        let approved = fixture
            .engine
            .decide_credit(order.id, CreditDecision::Approve, fixture.owner, Some("known customer".to_string()))
            .await
            .unwrap();
        assert_eq!(approved.credit_status, Some(CreditStatus::Approved));
        assert_eq!(approved.payment_due_date, Some(decided_at + chrono::Duration::days(30)));

        let paid = fixture.engine.mark_credit_paid(order.id, fixture.owner).await.unwrap();
        assert_eq!(paid.credit_status, Some(CreditStatus::Paid));
        assert_eq!(paid.payment_due_date, approved.payment_due_date);
        assert_eq!(paid.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_double_approval_rejected() {
        let fixture = Fixture::new();
        let product = fixture.product(3);
        let order = fixture.place(vec![line(product, 1, dec!(80))], PaymentMethod::Credit).await;

        fixture
            .engine
            .decide_credit(order.id, CreditDecision::Approve, fixture.owner, None)
            .await
            .unwrap();
        let err = fixture
            .engine
            .decide_credit(order.id, CreditDecision::Approve, fixture.owner, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(OrderError::InvalidCreditTransition { .. })));

        let history = fixture.engine.history(&fixture.admin(), order.id).await.unwrap();
        let credit_entries: Vec<_> = history
            .iter()
            .filter(|entry| entry.domain == HistoryDomain::Credit)
            .collect();
        assert_eq!(credit_entries.len(), 2);
        assert_eq!(credit_entries[1].to, TrackedState::Credit(CreditStatus::Approved));
    }

    #[tokio::test]
    async fn test_rejected_credit_keeps_stock_until_cancelled() {
        let fixture = Fixture::new();
        let product = fixture.product(3);
        let order = fixture.place(vec![line(product, 2, dec!(10))], PaymentMethod::Credit).await;

        let rejected = fixture
            .engine
            .decide_credit(order.id, CreditDecision::Reject, fixture.owner, None)
            .await
            .unwrap();
        assert_eq!(rejected.status, OrderStatus::Pending);
        assert_eq!(rejected.payment_due_date, None);
        assert_eq!(fixture.engine.stock_level(product), Ok(1));

        let err = fixture.engine.mark_credit_paid(order.id, fixture.owner).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));

        let err = fixture
            .engine
            .transition_status(order.id, OrderStatus::Processing, fixture.owner, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(OrderError::CreditNotGranted { .. })));

        fixture.engine.cancel_order(order.id, fixture.owner, None).await.unwrap();
        assert_eq!(fixture.engine.stock_level(product), Ok(3));
    }

    #[tokio::test]
    async fn test_credit_operations_on_cash_order_rejected() {
        let fixture = Fixture::new();
        let product = fixture.product(3);
        let order = fixture.place(vec![line(product, 1, dec!(10))], PaymentMethod::CashOnDelivery).await;

        let err = fixture
            .engine
            .decide_credit(order.id, CreditDecision::Approve, fixture.owner, None)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidTransition(OrderError::NotCreditOrder));
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let fixture = Fixture::new();
        let missing = Uuid::new_v4();

        let err = fixture.engine.mark_credit_paid(missing, fixture.owner).await.unwrap_err();
        assert_eq!(err, EngineError::order_not_found(missing));
    }

    #[tokio::test]
    async fn test_metrics_follow_operations() {
        let fixture = Fixture::new();
        let product = fixture.product(1);
        let order = fixture.place(vec![line(product, 1, dec!(10))], PaymentMethod::Credit).await;

        let _ = fixture
            .engine
            .create_order(fixture.order(vec![line(product, 1, dec!(10))], PaymentMethod::Credit), fixture.customer)
            .await;
        fixture.engine.cancel_order(order.id, fixture.customer, None).await.unwrap();

        let metrics = &fixture.metrics;
        assert_eq!(metrics.orders_created.with_label_values(&["credit"]).get(), 1);
        assert_eq!(metrics.stock_reservation_failures.get(), 1);
        assert_eq!(
            metrics
                .operations_rejected
                .with_label_values(&["create_order", "insufficient_stock"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .lifecycle_transitions
                .with_label_values(&["order", "pending", "cancelled"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .lifecycle_transitions
                .with_label_values(&["credit", "none", "requested"])
                .get(),
            1
        );
    }
}
