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

//! Order types: line items, payment routing, and discount charge targets.

use crate::base::{ItemId, OrderId, ProgramId, SessionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How an order was paid.
///
/// Cash stays in the physical drawer and shows up only in the close count;
/// CashApp credits the club's CashApp balance; Zelle settles outside the
/// club's hands and is journaled as an external settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    CashApp,
    Zelle,
}

/// Where a discount or comp is charged back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeTarget {
    /// Absorbed centrally by the student body; no program is charged.
    #[default]
    Asb,
    /// A specific sponsoring program.
    Program(ProgramId),
    /// Whichever program sponsors the order's session.
    SessionProgram,
}

/// One requested line of an order, before catalog pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub item_id: ItemId,
    pub quantity: u32,
    /// Overrides the catalog price when present.
    pub unit_price: Option<Decimal>,
}

impl OrderLineInput {
    pub fn new(item_id: ItemId, quantity: u32) -> Self {
        Self {
            item_id,
            quantity,
            unit_price: None,
        }
    }

    pub fn priced(item_id: ItemId, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            item_id,
            quantity,
            unit_price: Some(unit_price),
        }
    }
}

/// A priced order line as recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A full order request as submitted by a POS terminal.
#[derive(Debug, Clone, Default)]
pub struct OrderRequest {
    pub lines: Vec<OrderLineInput>,
    pub payment: PaymentMethod,
    pub amount_tendered: Decimal,
    pub discount_amount: Decimal,
    pub charged_to: ChargeTarget,
    pub is_comp: bool,
}

impl OrderRequest {
    /// Cash sale with no discount.
    pub fn cash(lines: Vec<OrderLineInput>, amount_tendered: Decimal) -> Self {
        Self {
            lines,
            amount_tendered,
            ..Self::default()
        }
    }
}

/// A recorded order, owned by its session.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub session_id: SessionId,
    pub lines: Vec<OrderLine>,
    pub payment: PaymentMethod,
    pub amount_tendered: Decimal,
    pub change_given: Decimal,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub charged_to: ChargeTarget,
    pub is_comp: bool,
    pub is_test: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn final_total(&self) -> Decimal {
        self.subtotal - self.discount_amount
    }
}

/// What the caller gets back from a successful `place_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub final_total: Decimal,
    pub change_given: Decimal,
}
