// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Lot-based FIFO inventory ledger.
//!
//! Each item's stock is a list of [`Lot`]s ordered by
//! `(purchase_date, lot_id)` ascending. Consumption drains the oldest lot
//! first and reports the per-lot breakdown, which is what makes true COGS
//! and its reimbursable share computable downstream.
//!
//! # Invariants
//!
//! - `0 <= quantity_remaining <= quantity_original` for every lot.
//! - The sum of `quantity_remaining` across an item's lots is the item's
//!   quantity on hand.
//! - A failed consumption leaves every lot untouched: sufficiency is
//!   checked up front under the item lock, never discovered mid-drain.
//!
//! # Thread Safety
//!
//! Stock is held in a [`DashMap`] of per-item [`Mutex`]es. Check-then-deduct
//! runs entirely under the item lock, so two concurrent consumers cannot
//! both win the last unit. [`InventoryLedger::on_hand`] is an
//! unsynchronized display read; `consume` re-checks under the lock.

use crate::base::{ItemId, LotId};
use crate::error::LedgerError;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A discrete batch of inventory received at one cost on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub id: LotId,
    pub item_id: ItemId,
    pub purchase_date: NaiveDate,
    pub quantity_original: u32,
    pub quantity_remaining: u32,
    pub unit_cost: Decimal,
    pub is_reimbursable: bool,
    pub vendor: Option<String>,
}

/// One lot's share of a consumption, as drained by FIFO order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotConsumption {
    pub lot_id: LotId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_cost: Decimal,
    pub is_reimbursable: bool,
}

impl LotConsumption {
    /// Cost of this slice of the consumption.
    pub fn value(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.quantity)
    }
}

/// Non-sale inventory adjustment.
///
/// The write-off kinds consume by FIFO exactly like a sale (and fail the
/// same way on insufficient stock); `Count` is a recount alignment that
/// bypasses cost accounting entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Lost(u32),
    Wasted(u32),
    Donated(u32),
    /// Signed on-hand delta. Positive appends a synthetic zero-cost lot;
    /// negative shrinks lots oldest-first, clamped at zero on hand.
    Count(i64),
}

/// Per-lot view for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct LotSnapshot {
    pub lot_id: LotId,
    pub purchase_date: NaiveDate,
    pub quantity_original: u32,
    pub quantity_remaining: u32,
    pub unit_cost: Decimal,
    pub is_reimbursable: bool,
}

/// Per-item stock view: on-hand count, remaining cost value, lots.
#[derive(Debug, Clone, Serialize)]
pub struct StockSnapshot {
    pub item_id: ItemId,
    pub on_hand: u64,
    pub value: Decimal,
    pub lots: Vec<LotSnapshot>,
}

#[derive(Debug, Default)]
struct ItemLots {
    /// Sorted by `(purchase_date, id)` ascending. Exhausted lots are kept
    /// for audit (`quantity_original` survives).
    lots: Vec<Lot>,
}

impl ItemLots {
    fn remaining(&self) -> u64 {
        self.lots.iter().map(|l| u64::from(l.quantity_remaining)).sum()
    }

    fn insert_sorted(&mut self, lot: Lot) {
        let key = (lot.purchase_date, lot.id);
        let idx = self
            .lots
            .partition_point(|l| (l.purchase_date, l.id) <= key);
        self.lots.insert(idx, lot);
    }

    /// Drains `quantity` oldest-first. Caller has verified sufficiency.
    fn take_fifo(&mut self, quantity: u32) -> Vec<LotConsumption> {
        let mut needed = quantity;
        let mut taken = Vec::new();
        for lot in &mut self.lots {
            if needed == 0 {
                break;
            }
            if lot.quantity_remaining == 0 {
                continue;
            }
            let take = lot.quantity_remaining.min(needed);
            lot.quantity_remaining -= take;
            needed -= take;
            taken.push(LotConsumption {
                lot_id: lot.id,
                item_id: lot.item_id,
                quantity: take,
                unit_cost: lot.unit_cost,
                is_reimbursable: lot.is_reimbursable,
            });
        }
        debug_assert_eq!(needed, 0, "take_fifo called without sufficiency check");
        self.assert_invariants();
        taken
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.lots
                .iter()
                .all(|l| l.quantity_remaining <= l.quantity_original),
            "Invariant violated: lot remaining exceeds original"
        );
    }
}

/// FIFO inventory ledger over all tracked items.
#[derive(Debug)]
pub struct InventoryLedger {
    stocks: DashMap<ItemId, Arc<Mutex<ItemLots>>>,
    next_lot_id: AtomicU64,
}

impl Default for InventoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self {
            stocks: DashMap::new(),
            next_lot_id: AtomicU64::new(1),
        }
    }

    fn stock(&self, item: ItemId) -> Arc<Mutex<ItemLots>> {
        self.stocks.entry(item).or_default().clone()
    }

    fn alloc_lot_id(&self) -> LotId {
        LotId(self.next_lot_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Appends a new lot, increasing the item's quantity on hand.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidQuantity`] - zero quantity.
    /// - [`LedgerError::InvalidAmount`] - negative unit cost.
    pub fn receive(
        &self,
        item: ItemId,
        quantity: u32,
        unit_cost: Decimal,
        is_reimbursable: bool,
        purchase_date: NaiveDate,
        vendor: Option<String>,
    ) -> Result<LotId, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        if unit_cost < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let id = self.alloc_lot_id();
        let stock = self.stock(item);
        let mut lots = stock.lock();
        lots.insert_sorted(Lot {
            id,
            item_id: item,
            purchase_date,
            quantity_original: quantity,
            quantity_remaining: quantity,
            unit_cost,
            is_reimbursable,
            vendor,
        });
        Ok(id)
    }

    /// Consumes `quantity` units oldest-first and returns the per-lot
    /// breakdown.
    ///
    /// Sufficiency is checked up front under the item lock; on
    /// [`LedgerError::InsufficientStock`] no lot is touched.
    pub fn consume(&self, item: ItemId, quantity: u32) -> Result<Vec<LotConsumption>, LedgerError> {
        if quantity == 0 {
            return Ok(Vec::new());
        }
        let stock = self.stock(item);
        let mut lots = stock.lock();
        if lots.remaining() < u64::from(quantity) {
            return Err(LedgerError::InsufficientStock(item));
        }
        Ok(lots.take_fifo(quantity))
    }

    /// Exact inverse of a prior consume: credits each quantity back to its
    /// original lot. Used by every rollback path (failed composite, failed
    /// multi-line order).
    pub fn restore(&self, consumptions: &[LotConsumption]) {
        for c in consumptions {
            let stock = self.stock(c.item_id);
            let mut lots = stock.lock();
            let found = lots.lots.iter_mut().find(|l| l.id == c.lot_id);
            debug_assert!(found.is_some(), "restore target lot missing");
            if let Some(lot) = found {
                lot.quantity_remaining += c.quantity;
            }
            lots.assert_invariants();
        }
    }

    /// Applies a non-sale adjustment and returns the new on-hand quantity
    /// plus the lots drained by a write-off (empty for recounts).
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientStock`] for a write-off beyond stock and
    /// [`LedgerError::InvalidQuantity`] for a zero write-off. Recounts
    /// never fail: negative deltas clamp at zero on hand.
    pub fn adjust(
        &self,
        item: ItemId,
        adjustment: Adjustment,
    ) -> Result<(u64, Vec<LotConsumption>), LedgerError> {
        match adjustment {
            Adjustment::Lost(q) | Adjustment::Wasted(q) | Adjustment::Donated(q) => {
                if q == 0 {
                    return Err(LedgerError::InvalidQuantity);
                }
                let stock = self.stock(item);
                let mut lots = stock.lock();
                if lots.remaining() < u64::from(q) {
                    return Err(LedgerError::InsufficientStock(item));
                }
                let taken = lots.take_fifo(q);
                Ok((lots.remaining(), taken))
            }
            Adjustment::Count(delta) => {
                let stock = self.stock(item);
                let mut lots = stock.lock();
                if delta >= 0 {
                    let quantity = u32::try_from(delta).unwrap_or(u32::MAX);
                    if quantity > 0 {
                        lots.insert_sorted(Lot {
                            id: self.alloc_lot_id(),
                            item_id: item,
                            purchase_date: chrono::Utc::now().date_naive(),
                            quantity_original: quantity,
                            quantity_remaining: quantity,
                            unit_cost: Decimal::ZERO,
                            is_reimbursable: false,
                            vendor: None,
                        });
                    }
                } else {
                    let shrink = delta
                        .unsigned_abs()
                        .min(lots.remaining())
                        .min(u64::from(u32::MAX)) as u32;
                    if shrink > 0 {
                        // Recounts align on-hand with observed reality and
                        // carry no cost accounting.
                        let _ = lots.take_fifo(shrink);
                    }
                }
                Ok((lots.remaining(), Vec::new()))
            }
        }
    }

    /// Removes the given lots entirely, as part of deleting the purchase
    /// that created them.
    ///
    /// Every lot must still be intact (`remaining == original`). The first
    /// lot that is not aborts the whole reversal: lots already removed by
    /// this call are reinserted and
    /// [`LedgerError::CannotReverseConsumedLot`] names the offender.
    pub fn reverse_lots(&self, lots: &[(ItemId, LotId)]) -> Result<(), LedgerError> {
        let mut removed: Vec<Lot> = Vec::new();
        for &(item, lot_id) in lots {
            let stock = self.stock(item);
            let mut guard = stock.lock();
            let intact = guard
                .lots
                .iter()
                .position(|l| l.id == lot_id && l.quantity_remaining == l.quantity_original);
            match intact {
                Some(idx) => removed.push(guard.lots.remove(idx)),
                None => {
                    drop(guard);
                    self.reinsert(removed);
                    return Err(LedgerError::CannotReverseConsumedLot(lot_id));
                }
            }
        }
        Ok(())
    }

    fn reinsert(&self, lots: Vec<Lot>) {
        for lot in lots {
            let stock = self.stock(lot.item_id);
            stock.lock().insert_sorted(lot);
        }
    }

    /// Best-effort display read of an item's quantity on hand.
    pub fn on_hand(&self, item: ItemId) -> u64 {
        match self.stocks.get(&item) {
            Some(stock) => stock.lock().remaining(),
            None => 0,
        }
    }

    /// Remaining cost value of an item's stock.
    pub fn stock_value(&self, item: ItemId) -> Decimal {
        match self.stocks.get(&item) {
            Some(stock) => stock
                .lock()
                .lots
                .iter()
                .map(|l| l.unit_cost * Decimal::from(l.quantity_remaining))
                .sum(),
            None => Decimal::ZERO,
        }
    }

    /// Point-in-time view of an item's lots.
    pub fn snapshot(&self, item: ItemId) -> StockSnapshot {
        let (on_hand, value, lots) = match self.stocks.get(&item) {
            Some(stock) => {
                let guard = stock.lock();
                let lots: Vec<LotSnapshot> = guard
                    .lots
                    .iter()
                    .map(|l| LotSnapshot {
                        lot_id: l.id,
                        purchase_date: l.purchase_date,
                        quantity_original: l.quantity_original,
                        quantity_remaining: l.quantity_remaining,
                        unit_cost: l.unit_cost,
                        is_reimbursable: l.is_reimbursable,
                    })
                    .collect();
                let value = guard
                    .lots
                    .iter()
                    .map(|l| l.unit_cost * Decimal::from(l.quantity_remaining))
                    .sum();
                (guard.remaining(), value, lots)
            }
            None => (0, Decimal::ZERO, Vec::new()),
        };
        StockSnapshot {
            item_id: item,
            on_hand,
            value,
            lots,
        }
    }

    /// All item ids that have ever held stock.
    pub fn items(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.stocks.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }
}
