//! Shared fixtures for engine and API tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::order::{ItemRequest, OrderEvent, PaymentMethod};
use crate::domain::stock::StockLedger;
use crate::event_sourcing::{EventEnvelope, EventStore, InMemoryEventStore, StoreError};
use crate::metrics::Metrics;

use super::clock::Clock;
use super::lifecycle::{EngineSettings, LifecycleEngine, NewOrder};
use super::views::{OrderView, Viewer};

/// Manually advanced clock
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

/// In-memory store whose next append can be made to fail
pub struct FlakyStore {
    inner: InMemoryEventStore<OrderEvent>,
    fail_next: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryEventStore::new("Order"),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next_append(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventStore<OrderEvent> for FlakyStore {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<OrderEvent>>,
    ) -> Result<i64, StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: expected_version + 1,
            });
        }
        self.inner.append_events(aggregate_id, expected_version, events).await
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<OrderEvent>>, StoreError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        self.inner.get_current_version(aggregate_id).await
    }

    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        self.inner.aggregate_ids().await
    }
}

pub fn line(product_id: Uuid, quantity: i32, unit_price: Decimal) -> ItemRequest {
    ItemRequest {
        product_id,
        quantity,
        unit_price,
    }
}

pub struct Fixture {
    pub engine: LifecycleEngine,
    pub store: Arc<FlakyStore>,
    pub clock: Arc<FixedClock>,
    pub metrics: Arc<Metrics>,
    pub customer: Uuid,
    pub owner: Uuid,
    pub shop: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(FlakyStore::new());
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()));
        let metrics = Arc::new(Metrics::new().unwrap());

        let engine = LifecycleEngine::new(
            store.clone(),
            Arc::new(StockLedger::new()),
            clock.clone(),
            EngineSettings::default(),
            metrics.clone(),
        );

        Self {
            engine,
            store,
            clock,
            metrics,
            customer: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            shop: Uuid::new_v4(),
        }
    }

    pub fn product(&self, quantity: u32) -> Uuid {
        let product_id = Uuid::new_v4();
        self.engine.set_stock(product_id, quantity, self.owner).unwrap();
        product_id
    }

    pub fn order(&self, items: Vec<ItemRequest>, payment_method: PaymentMethod) -> NewOrder {
        self.order_for(self.customer, self.shop, items, payment_method)
    }

    pub fn order_for(
        &self,
        customer_id: Uuid,
        shop_id: Uuid,
        items: Vec<ItemRequest>,
        payment_method: PaymentMethod,
    ) -> NewOrder {
        NewOrder {
            customer_id,
            shop_id,
            items,
            shipping_address: "4 Avenue Habib Bourguiba, Sfax".to_string(),
            phone_number: "+21698765432".to_string(),
            payment_method,
            payment_reference: (payment_method == PaymentMethod::Card).then(|| "pay_7QpX".to_string()),
            total_price: None,
        }
    }

    pub async fn place(&self, items: Vec<ItemRequest>, payment_method: PaymentMethod) -> OrderView {
        self.engine
            .create_order(self.order(items, payment_method), self.customer)
            .await
            .unwrap()
    }

    pub fn admin(&self) -> Viewer {
        Viewer::Admin { admin_id: Uuid::new_v4() }
    }

    pub fn shop_owner(&self) -> Viewer {
        Viewer::ShopOwner {
            owner_id: self.owner,
            shop_ids: vec![self.shop],
        }
    }

    pub fn customer_viewer(&self) -> Viewer {
        Viewer::Customer { customer_id: self.customer }
    }
}
