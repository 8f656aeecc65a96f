use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    #[error("Unknown product {0}")]
    UnknownProduct(Uuid),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Stock level {quantity} for product {product_id} leaves no room for {held} held units")]
    AboveCapacity { product_id: Uuid, quantity: u32, held: u32 },

    #[error("Stock for product {product_id} would overflow")]
    Overflow { product_id: Uuid },
}
