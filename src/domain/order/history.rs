use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::event_sourcing::EventEnvelope;
use super::events::OrderEvent;
use super::value_objects::{CreditStatus, OrderStatus};

// ============================================================================
// History Ledger - Audit Trail Projection
// ============================================================================
//
// The order's event stream is append-only and holds exactly one event per
// accepted transition, so history entries are read straight off it. Nothing
// here can write; entries are "appended" by appending the event.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryDomain {
    Order,
    Credit,
}

impl HistoryDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryDomain::Order => "order",
            HistoryDomain::Credit => "credit",
        }
    }
}

/// A state on either axis, serialized as its bare name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackedState {
    Order(OrderStatus),
    Credit(CreditStatus),
}

impl TrackedState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedState::Order(status) => status.as_str(),
            TrackedState::Credit(status) => status.as_str(),
        }
    }
}

impl fmt::Display for TrackedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OrderStatus> for TrackedState {
    fn from(status: OrderStatus) -> Self {
        TrackedState::Order(status)
    }
}

impl From<CreditStatus> for TrackedState {
    fn from(status: CreditStatus) -> Self {
        TrackedState::Credit(status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub order_id: Uuid,
    pub sequence: i64,
    pub domain: HistoryDomain,
    pub from: Option<TrackedState>,
    pub to: TrackedState,
    pub changed_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub note: Option<String>,
}

/// Chronological history of one order, derived from its event stream.
///
/// `from` is the state on the same axis before the event, `None` for the
/// first entry of each axis.
pub fn history_from_events(events: &[EventEnvelope<OrderEvent>]) -> Vec<HistoryEntry> {
    let mut order_state: Option<TrackedState> = None;
    let mut credit_state: Option<TrackedState> = None;

    events
        .iter()
        .map(|envelope| {
            let (domain, to) = envelope.event_data.target();
            let slot = match domain {
                HistoryDomain::Order => &mut order_state,
                HistoryDomain::Credit => &mut credit_state,
            };
            let from = slot.replace(to);

            HistoryEntry {
                order_id: envelope.aggregate_id,
                sequence: envelope.sequence_number,
                domain,
                from,
                to,
                changed_at: envelope.event_data.occurred_at(),
                actor_id: envelope.actor_id,
                note: envelope.event_data.note().map(str::to_string),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::events::*;
    use crate::domain::order::value_objects::PaymentMethod;
    use rust_decimal_macros::dec;

    fn envelope(order_id: Uuid, seq: i64, event: OrderEvent, actor: Uuid) -> EventEnvelope<OrderEvent> {
        let at = event.occurred_at();
        EventEnvelope::new(order_id, seq, event, Uuid::new_v4(), at).with_actor(actor)
    }

    #[test]
    fn test_history_tracks_both_axes_independently() {
        let order_id = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let events = vec![
            envelope(order_id, 1, OrderEvent::Placed(OrderPlaced {
                order_id,
                customer_id: customer,
                shop_id: Uuid::new_v4(),
                items: vec![],
                total_price: dec!(0),
                shipping_address: String::new(),
                phone_number: String::new(),
                payment_method: PaymentMethod::Credit,
                payment_reference: None,
                placed_at: now,
            }), customer),
            envelope(order_id, 2, OrderEvent::CreditRequested(CreditRequested { requested_at: now }), customer),
            envelope(order_id, 3, OrderEvent::CreditApproved(CreditApproved {
                approved_at: now,
                payment_due_date: now,
                note: Some("regular customer".to_string()),
            }), owner),
            envelope(order_id, 4, OrderEvent::ProcessingStarted(OrderProcessingStarted {
                started_at: now,
                note: None,
            }), owner),
        ];

        let history = history_from_events(&events);
        assert_eq!(history.len(), 4);

        assert_eq!(history[0].domain, HistoryDomain::Order);
        assert_eq!(history[0].from, None);
        assert_eq!(history[0].to, TrackedState::Order(OrderStatus::Pending));

        assert_eq!(history[1].domain, HistoryDomain::Credit);
        assert_eq!(history[1].from, None);
        assert_eq!(history[1].to, TrackedState::Credit(CreditStatus::Requested));

        assert_eq!(history[2].from, Some(TrackedState::Credit(CreditStatus::Requested)));
        assert_eq!(history[2].actor_id, Some(owner));
        assert_eq!(history[2].note.as_deref(), Some("regular customer"));

        assert_eq!(history[3].from, Some(TrackedState::Order(OrderStatus::Pending)));
        assert_eq!(history[3].to, TrackedState::Order(OrderStatus::Processing));
    }

    #[test]
    fn test_entry_serializes_states_as_bare_names() {
        let entry = HistoryEntry {
            order_id: Uuid::new_v4(),
            sequence: 2,
            domain: HistoryDomain::Order,
            from: Some(OrderStatus::Pending.into()),
            to: OrderStatus::Cancelled.into(),
            changed_at: Utc::now(),
            actor_id: None,
            note: None,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["from"], "pending");
        assert_eq!(json["to"], "cancelled");
        assert_eq!(json["domain"], "order");
        assert!(json.get("changedAt").is_some());
    }
}
