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

//! Reimbursable-cost tracking.
//!
//! Purchase-backed stock is reimbursable to whoever fronted the receipt;
//! manual stock and donations are not. This tracker splits every consumed
//! lot's cost by the lot's flag and exposes running totals for club
//! accounting. It is a derived view: it never mutates inventory or any
//! ledger.

use crate::inventory::LotConsumption;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;

/// Consumed cost split by reimbursability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CostSplit {
    pub reimbursable: Decimal,
    pub non_reimbursable: Decimal,
}

impl CostSplit {
    pub fn total(&self) -> Decimal {
        self.reimbursable + self.non_reimbursable
    }
}

/// Running reimbursable/non-reimbursable totals across all consumption.
#[derive(Debug, Default)]
pub struct ReimbursementTracker {
    totals: Mutex<CostSplit>,
}

impl ReimbursementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values a consumption breakdown without recording it.
    pub fn cost_of(consumptions: &[LotConsumption]) -> CostSplit {
        let mut split = CostSplit::default();
        for c in consumptions {
            if c.is_reimbursable {
                split.reimbursable += c.value();
            } else {
                split.non_reimbursable += c.value();
            }
        }
        split
    }

    /// Rolls a consumption breakdown into the running totals.
    pub fn record(&self, consumptions: &[LotConsumption]) {
        let split = Self::cost_of(consumptions);
        let mut totals = self.totals.lock();
        totals.reimbursable += split.reimbursable;
        totals.non_reimbursable += split.non_reimbursable;
    }

    pub fn totals(&self) -> CostSplit {
        *self.totals.lock()
    }
}
