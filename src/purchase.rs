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

//! Vendor purchase intake.
//!
//! A purchase turns a paper receipt into lots: each line's share of the
//! receipt-level overhead (tax, delivery, other fees) is allocated in
//! proportion to the line's total, and the resulting effective unit cost
//! is what the lot carries into FIFO costing:
//!
//! ```text
//! overhead_share(line) = line_total / sum(line_totals) * (tax + delivery + other)
//! unit_cost(line)      = (line_total + overhead_share) / quantity + crv_per_unit
//! ```
//!
//! Lines without a catalog item id ("unlinked") are kept for audit but
//! never touch inventory; the intake receipt reports how many so callers
//! can warn.

use crate::base::{ItemId, LotId, PurchaseId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One receipt line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Catalog item this line stocks; `None` for unlinked (audit-only)
    /// lines.
    pub item_id: Option<ItemId>,
    pub item_name: String,
    pub quantity: u32,
    pub line_total: Decimal,
    /// Per-unit container deposit (CRV), added after overhead allocation.
    pub crv_per_unit: Decimal,
}

impl PurchaseLine {
    pub fn linked(item_id: ItemId, name: &str, quantity: u32, line_total: Decimal) -> Self {
        Self {
            item_id: Some(item_id),
            item_name: name.to_string(),
            quantity,
            line_total,
            crv_per_unit: Decimal::ZERO,
        }
    }

    pub fn unlinked(name: &str, quantity: u32, line_total: Decimal) -> Self {
        Self {
            item_id: None,
            item_name: name.to_string(),
            quantity,
            line_total,
            crv_per_unit: Decimal::ZERO,
        }
    }

    pub fn with_crv(mut self, crv_per_unit: Decimal) -> Self {
        self.crv_per_unit = crv_per_unit;
        self
    }
}

/// A recorded vendor purchase and the lots its intake created.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub id: PurchaseId,
    pub vendor: String,
    pub date: NaiveDate,
    pub lines: Vec<PurchaseLine>,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub other_fees: Decimal,
    pub notes: Option<String>,
    pub(crate) created_lots: Vec<(ItemId, LotId)>,
}

impl Purchase {
    pub fn overhead_total(&self) -> Decimal {
        self.tax + self.delivery_fee + self.other_fees
    }

    /// Lots created by this purchase's intake, in line order.
    pub fn created_lots(&self) -> &[(ItemId, LotId)] {
        &self.created_lots
    }
}

/// Per-line overhead share and effective unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCost {
    pub overhead_share: Decimal,
    pub unit_cost: Decimal,
}

/// Allocates receipt overhead across lines in proportion to line totals
/// and computes each line's effective unit cost.
///
/// A receipt whose lines total zero gets no overhead allocation. Lines
/// with zero quantity get a zero unit cost (the caller rejects them for
/// linked lines before intake).
pub fn allocate_line_costs(lines: &[PurchaseLine], overhead: Decimal) -> Vec<LineCost> {
    let goods_total: Decimal = lines.iter().map(|l| l.line_total).sum();
    lines
        .iter()
        .map(|line| {
            let overhead_share = if goods_total.is_zero() {
                Decimal::ZERO
            } else {
                line.line_total / goods_total * overhead
            };
            let unit_cost = if line.quantity == 0 {
                Decimal::ZERO
            } else {
                (line.line_total + overhead_share) / Decimal::from(line.quantity)
                    + line.crv_per_unit
            };
            LineCost {
                overhead_share,
                unit_cost,
            }
        })
        .collect()
}
