use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_sourcing::Aggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{
    CreditAccount, CreditDecision, CreditStatus, ItemRequest, OrderItem, OrderStatus, PaymentMethod,
};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Current State (derived from events)
    pub customer_id: Uuid,
    pub shop_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_price: Decimal,
    pub shipping_address: String,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub status: OrderStatus,
    pub credit: Option<CreditAccount>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub cancelled_reason: Option<String>,
}

impl OrderAggregate {
    pub fn is_credit_order(&self) -> bool {
        self.credit.is_some()
    }

    pub fn credit_status(&self) -> Option<CreditStatus> {
        self.credit.as_ref().map(|credit| credit.status)
    }

    pub fn payment_due_date(&self) -> Option<DateTime<Utc>> {
        self.credit.as_ref().and_then(|credit| credit.payment_due_date)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.credit.as_ref().is_some_and(|credit| credit.is_overdue(now))
    }

    /// `(product, quantity)` pairs this order holds in the stock ledger
    pub fn reserved_lines(&self) -> Vec<(Uuid, u32)> {
        self.items.iter().map(|item| (item.product_id, item.quantity)).collect()
    }

    /// Validate requested items and compute subtotals
    fn validate_items(items: &[ItemRequest]) -> Result<Vec<OrderItem>, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        items
            .iter()
            .map(|item| {
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|quantity| *quantity > 0)
                    .ok_or(OrderError::InvalidQuantity {
                        product_id: item.product_id,
                        quantity: item.quantity,
                    })?;

                if item.unit_price.is_sign_negative() && !item.unit_price.is_zero() {
                    return Err(OrderError::NegativePrice {
                        product_id: item.product_id,
                        unit_price: item.unit_price,
                    });
                }

                OrderItem::new(item.product_id, quantity, item.unit_price).ok_or(OrderError::AmountOverflow {
                    product_id: item.product_id,
                })
            })
            .collect()
    }

    fn credit_mut(&mut self) -> Result<&mut CreditAccount, OrderError> {
        self.credit.as_mut().ok_or(OrderError::NotCreditOrder)
    }

    fn handle_transition(
        &self,
        target: OrderStatus,
        note: &Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }

        // Fulfilment of a credit order waits for the credit to be granted
        if let Some(credit) = &self.credit {
            if target != OrderStatus::Cancelled && !credit.status.is_granted() {
                return Err(OrderError::CreditNotGranted {
                    to: target,
                    credit: credit.status,
                });
            }
        }

        let note = note.clone();
        let event = match target {
            OrderStatus::Processing => OrderEvent::ProcessingStarted(OrderProcessingStarted {
                started_at: at,
                note,
            }),
            OrderStatus::Shipped => OrderEvent::Shipped(OrderShipped { shipped_at: at, note }),
            OrderStatus::Delivered => OrderEvent::Delivered(OrderDelivered { delivered_at: at, note }),
            OrderStatus::Cancelled => OrderEvent::Cancelled(OrderCancelled {
                cancelled_at: at,
                reason: note,
            }),
            // Unreachable: no legal edge leads back to pending
            OrderStatus::Pending => {
                return Err(OrderError::InvalidStatusTransition {
                    from: self.status,
                    to: target,
                })
            }
        };

        Ok(vec![event])
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn initialize(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let OrderCommand::PlaceOrder {
            order_id,
            customer_id,
            shop_id,
            items,
            shipping_address,
            phone_number,
            payment_method,
            payment_reference,
            expected_total,
            at,
        } = command
        else {
            return Err(OrderError::NotInitialized);
        };

        let items = Self::validate_items(items)?;
        let total_price = items.iter().try_fold(Decimal::ZERO, |total, item| {
            total
                .checked_add(item.subtotal)
                .ok_or(OrderError::AmountOverflow { product_id: item.product_id })
        })?;

        if let Some(expected) = expected_total {
            if *expected != total_price {
                return Err(OrderError::TotalMismatch {
                    expected: *expected,
                    computed: total_price,
                });
            }
        }

        let payment_reference = payment_reference
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .map(str::to_string);
        if *payment_method == PaymentMethod::Card && payment_reference.is_none() {
            return Err(OrderError::MissingPaymentReference);
        }

        let mut events = vec![OrderEvent::Placed(OrderPlaced {
            order_id: *order_id,
            customer_id: *customer_id,
            shop_id: *shop_id,
            items,
            total_price,
            shipping_address: shipping_address.clone(),
            phone_number: phone_number.clone(),
            payment_method: *payment_method,
            payment_reference,
            placed_at: *at,
        })];

        // Credit is requested at creation time or never
        if *payment_method == PaymentMethod::Credit {
            events.push(OrderEvent::CreditRequested(CreditRequested { requested_at: *at }));
        }

        Ok(events)
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Placed(e) => Ok(Self {
                id: e.order_id,
                version: 1,
                customer_id: e.customer_id,
                shop_id: e.shop_id,
                items: e.items.clone(),
                total_price: e.total_price,
                shipping_address: e.shipping_address.clone(),
                phone_number: e.phone_number.clone(),
                payment_method: e.payment_method,
                payment_reference: e.payment_reference.clone(),
                status: OrderStatus::Pending,
                credit: None,
                created_at: e.placed_at,
                updated_at: e.placed_at,
                cancelled_reason: None,
            }),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Placed(_) => return Err(OrderError::AlreadyPlaced),
            OrderEvent::ProcessingStarted(_) => {
                self.status = OrderStatus::Processing;
            }
            OrderEvent::Shipped(_) => {
                self.status = OrderStatus::Shipped;
            }
            OrderEvent::Delivered(_) => {
                self.status = OrderStatus::Delivered;
            }
            OrderEvent::Cancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.cancelled_reason = e.reason.clone();
            }
            OrderEvent::CreditRequested(e) => {
                self.credit = Some(CreditAccount::requested(e.requested_at));
            }
            OrderEvent::CreditApproved(e) => {
                let credit = self.credit_mut()?;
                credit.status = CreditStatus::Approved;
                credit.decided_at = Some(e.approved_at);
                credit.payment_due_date = Some(e.payment_due_date);
                credit.decision_note = e.note.clone();
            }
            OrderEvent::CreditRejected(e) => {
                let credit = self.credit_mut()?;
                credit.status = CreditStatus::Rejected;
                credit.decided_at = Some(e.rejected_at);
                credit.decision_note = e.note.clone();
            }
            OrderEvent::CreditPaid(e) => {
                let credit = self.credit_mut()?;
                credit.status = CreditStatus::Paid;
                credit.paid_at = Some(e.paid_at);
            }
        }

        self.updated_at = event.occurred_at();
        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder { .. } => Err(OrderError::AlreadyPlaced),

            OrderCommand::TransitionStatus { target, note, at } => {
                self.handle_transition(*target, note, *at)
            }

            OrderCommand::DecideCredit { decision, note, credit_term, at } => {
                let credit = self.credit.as_ref().ok_or(OrderError::NotCreditOrder)?;
                let action = match decision {
                    CreditDecision::Approve => "approve",
                    CreditDecision::Reject => "reject",
                };

                if credit.status != CreditStatus::Requested {
                    return Err(OrderError::InvalidCreditTransition {
                        from: credit.status,
                        action,
                    });
                }
                if self.status == OrderStatus::Cancelled {
                    return Err(OrderError::CreditDecisionOnClosedOrder(self.status));
                }

                let event = match decision {
                    CreditDecision::Approve => OrderEvent::CreditApproved(CreditApproved {
                        approved_at: *at,
                        payment_due_date: *at + *credit_term,
                        note: note.clone(),
                    }),
                    CreditDecision::Reject => OrderEvent::CreditRejected(CreditRejected {
                        rejected_at: *at,
                        note: note.clone(),
                    }),
                };

                Ok(vec![event])
            }

            OrderCommand::MarkCreditPaid { at } => {
                let credit = self.credit.as_ref().ok_or(OrderError::NotCreditOrder)?;
                if credit.status != CreditStatus::Approved {
                    return Err(OrderError::InvalidCreditTransition {
                        from: credit.status,
                        action: "mark paid",
                    });
                }

                Ok(vec![OrderEvent::CreditPaid(CreditPaid { paid_at: *at })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
