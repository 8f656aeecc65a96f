use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::order::{history_from_events, HistoryEntry, OrderAggregate, OrderEvent};
use crate::event_sourcing::{Aggregate, EventEnvelope};

use super::errors::EngineError;
use super::lifecycle::LifecycleEngine;
use super::views::{CreditSummary, CustomerCredit, OrderFilter, OrderView, Viewer};

// ============================================================================
// Read Side
// ============================================================================
//
// Reads never take the per-order lock. Each order is rebuilt from one
// load_events call, which the store answers from a single snapshot.
//
// ============================================================================

type LoadedOrder = (OrderAggregate, Vec<EventEnvelope<OrderEvent>>);

impl LifecycleEngine {
    pub async fn get_order(&self, viewer: &Viewer, order_id: Uuid) -> Result<OrderView, EngineError> {
        let (order, events) = self.load_visible(viewer, order_id).await?;
        Ok(OrderView::project(&order, history_from_events(&events), self.clock.now()))
    }

    /// Chronological history of both axes of one order
    pub async fn history(&self, viewer: &Viewer, order_id: Uuid) -> Result<Vec<HistoryEntry>, EngineError> {
        let (_, events) = self.load_visible(viewer, order_id).await?;
        Ok(history_from_events(&events))
    }

    /// Orders the viewer may see that match `filter`, newest first
    pub async fn list_orders(&self, viewer: &Viewer, filter: &OrderFilter) -> Result<Vec<OrderView>, EngineError> {
        let now = self.clock.now();
        let window = self.settings.due_soon_window;

        let mut views: Vec<OrderView> = self
            .load_all_visible(viewer)
            .await?
            .into_iter()
            .filter(|(order, _)| filter.matches(order, now, window))
            .map(|(order, events)| OrderView::project(&order, history_from_events(&events), now))
            .collect();

        views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        tracing::debug!(actor_id = %viewer.actor_id(), count = views.len(), "Listed orders");
        Ok(views)
    }

    pub async fn list_orders_for_customer(
        &self,
        customer_id: Uuid,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderView>, EngineError> {
        self.list_orders(&Viewer::Customer { customer_id }, filter).await
    }

    pub async fn list_orders_for_shop(
        &self,
        owner_id: Uuid,
        shop_ids: Vec<Uuid>,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderView>, EngineError> {
        self.list_orders(&Viewer::ShopOwner { owner_id, shop_ids }, filter).await
    }

    pub async fn list_orders_for_admin(
        &self,
        admin_id: Uuid,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderView>, EngineError> {
        self.list_orders(&Viewer::Admin { admin_id }, filter).await
    }

    pub async fn credit_summary(&self, viewer: &Viewer) -> Result<CreditSummary, EngineError> {
        let now = self.clock.now();
        let mut summary = CreditSummary::default();

        for (order, _) in self.load_all_visible(viewer).await? {
            summary.add(&order, now);
        }

        Ok(summary)
    }

    /// Credit exposure per customer, largest total first
    pub async fn credits_by_customer(&self, viewer: &Viewer) -> Result<Vec<CustomerCredit>, EngineError> {
        let now = self.clock.now();
        let mut by_customer: HashMap<Uuid, CustomerCredit> = HashMap::new();

        for (order, _) in self.load_all_visible(viewer).await? {
            if !order.is_credit_order() {
                continue;
            }
            by_customer
                .entry(order.customer_id)
                .or_insert_with(|| CustomerCredit::new(order.customer_id))
                .add(&order, now);
        }

        let mut credits: Vec<_> = by_customer.into_values().collect();
        credits.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        Ok(credits)
    }

    async fn load(&self, order_id: Uuid) -> Result<Option<LoadedOrder>, EngineError> {
        let events = self.store.load_events(order_id).await?;
        Ok(OrderAggregate::load_from_events(&events)?.map(|order| (order, events)))
    }

    /// Orders outside the viewer's scope are reported as missing
    async fn load_visible(&self, viewer: &Viewer, order_id: Uuid) -> Result<LoadedOrder, EngineError> {
        match self.load(order_id).await? {
            Some((order, events)) if viewer.can_view(&order) => Ok((order, events)),
            _ => Err(EngineError::order_not_found(order_id)),
        }
    }

    async fn load_all_visible(&self, viewer: &Viewer) -> Result<Vec<LoadedOrder>, EngineError> {
        let mut orders = Vec::new();
        for order_id in self.store.aggregate_ids().await? {
            if let Some((order, events)) = self.load(order_id).await? {
                if viewer.can_view(&order) {
                    orders.push((order, events));
                }
            }
        }
        Ok(orders)
    }
}
