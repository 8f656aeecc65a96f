use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{CreditDecision, ItemRequest, OrderStatus, PaymentMethod};
use crate::engine::NewOrder;

// ============================================================================
// Request / Response Bodies
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shop_id: Uuid,
    pub items: Vec<ItemRequest>,
    pub shipping_address: String,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

impl CreateOrderRequest {
    pub fn into_new_order(self, customer_id: Uuid) -> NewOrder {
        NewOrder {
            customer_id,
            shop_id: self.shop_id,
            items: self.items,
            shipping_address: self.shipping_address,
            phone_number: self.phone_number,
            payment_method: self.payment_method,
            payment_reference: self.payment_reference,
            total_price: self.total_price,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditDecisionRequest {
    pub decision: CreditDecision,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetStockRequest {
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevelResponse {
    pub product_id: Uuid,
    pub available_quantity: u32,
}
