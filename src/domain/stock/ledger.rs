use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use super::errors::StockError;

// ============================================================================
// Stock Ledger
// ============================================================================
//
// The outer RwLock only guards the product table itself; quantities live
// behind one Mutex per product. Multi-product reservations lock products in
// ascending id order so two orders over the same products cannot deadlock.
//
// Each product also counts the units held by reservations. `available + held`
// never exceeds `u32::MAX`, so giving held units back cannot overflow.
//
// ============================================================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct StockLevel {
    available: u32,
    held: u32,
}

#[derive(Debug, Default)]
pub struct StockLedger {
    products: RwLock<HashMap<Uuid, Arc<Mutex<StockLevel>>>>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, product_id: Uuid) -> Result<Arc<Mutex<StockLevel>>, StockError> {
        self.products
            .read()
            .get(&product_id)
            .cloned()
            .ok_or(StockError::UnknownProduct(product_id))
    }

    /// Upsert the available quantity for a product.
    ///
    /// Units held by reservations are not part of `quantity`. A reservation
    /// still in flight that rolls back afterwards returns its units on top
    /// of the new level.
    pub fn set_stock(&self, product_id: Uuid, quantity: u32) -> Result<(), StockError> {
        let record = match self.record(product_id) {
            Ok(record) => record,
            Err(_) => self
                .products
                .write()
                .entry(product_id)
                .or_insert_with(|| Arc::new(Mutex::new(StockLevel::default())))
                .clone(),
        };

        let mut level = record.lock();
        if quantity.checked_add(level.held).is_none() {
            return Err(StockError::AboveCapacity {
                product_id,
                quantity,
                held: level.held,
            });
        }
        level.available = quantity;
        Ok(())
    }

    pub fn available(&self, product_id: Uuid) -> Result<u32, StockError> {
        Ok(self.record(product_id)?.lock().available)
    }

    /// Units currently held by reservations
    pub fn held(&self, product_id: Uuid) -> Result<u32, StockError> {
        Ok(self.record(product_id)?.lock().held)
    }

    /// Check-and-decrement for a single product
    pub fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<(), StockError> {
        let record = self.record(product_id)?;
        let mut level = record.lock();
        Self::take(&mut level, product_id, quantity)
    }

    pub fn release(&self, product_id: Uuid, quantity: u32) -> Result<(), StockError> {
        let record = self.record(product_id)?;
        let mut level = record.lock();

        level.available = level
            .available
            .checked_add(quantity)
            .ok_or(StockError::Overflow { product_id })?;
        level.held = level.held.saturating_sub(quantity);
        Ok(())
    }

    fn take(level: &mut StockLevel, product_id: Uuid, quantity: u32) -> Result<(), StockError> {
        if level.available < quantity {
            return Err(StockError::InsufficientStock {
                product_id,
                requested: quantity,
                available: level.available,
            });
        }

        level.available -= quantity;
        level.held += quantity;
        Ok(())
    }

    /// Reserve every line or none of them.
    ///
    /// Lines for the same product are summed first. The returned guard puts
    /// the stock back when dropped unless [`Reservation::commit`] is called.
    pub fn reserve_all(&self, lines: &[(Uuid, u32)]) -> Result<Reservation<'_>, StockError> {
        let mut merged: BTreeMap<Uuid, u32> = BTreeMap::new();
        for (product_id, quantity) in lines {
            let total = merged.entry(*product_id).or_insert(0);
            *total = total
                .checked_add(*quantity)
                .ok_or(StockError::Overflow { product_id: *product_id })?;
        }

        let records = merged
            .keys()
            .map(|product_id| self.record(*product_id))
            .collect::<Result<Vec<_>, _>>()?;

        // BTreeMap iteration is sorted, so this is the global lock order
        let mut guards: Vec<_> = records.iter().map(|record| record.lock()).collect();

        for ((product_id, requested), level) in merged.iter().zip(guards.iter()) {
            if level.available < *requested {
                return Err(StockError::InsufficientStock {
                    product_id: *product_id,
                    requested: *requested,
                    available: level.available,
                });
            }
        }

        for ((product_id, requested), level) in merged.iter().zip(guards.iter_mut()) {
            Self::take(level, *product_id, *requested)?;
        }
        drop(guards);

        Ok(Reservation {
            ledger: self,
            lines: merged.into_iter().collect(),
            committed: false,
        })
    }

    /// Give back stock held by a cancelled order
    pub fn release_all(&self, lines: &[(Uuid, u32)]) -> Result<(), StockError> {
        for (product_id, quantity) in lines {
            self.release(*product_id, *quantity)?;
        }
        Ok(())
    }
}

// ============================================================================
// Reservation Guard
// ============================================================================

/// Stock taken by [`StockLedger::reserve_all`], returned on drop unless
/// committed.
#[must_use = "dropping a reservation returns the stock"]
#[derive(Debug)]
pub struct Reservation<'a> {
    ledger: &'a StockLedger,
    lines: Vec<(Uuid, u32)>,
    committed: bool,
}

impl Reservation<'_> {
    /// Keep the stock reserved for good
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        tracing::debug!(lines = self.lines.len(), "Rolling back stock reservation");
        if let Err(e) = self.ledger.release_all(&self.lines) {
            tracing::error!(error = %e, "Failed to roll back stock reservation");
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
