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

//! Cash-drawer denomination counts.
//!
//! A [`DrawerCount`] is the physical count of a drawer at session start or
//! close: quarters plus the six bill denominations. All valuation is done
//! in [`Decimal`], never floats.
//!
//! # Example
//!
//! ```
//! use concession_ledger_rs::DrawerCount;
//! use rust_decimal_macros::dec;
//!
//! let drawer = DrawerCount { quarters: 2, ones: 3, fives: 1, ..DrawerCount::default() };
//! assert_eq!(drawer.value(), dec!(8.50));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Counts of each denomination held in a cash drawer.
///
/// Immutable once counted into a session: sessions store the count by
/// value at start and close and never alter it afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerCount {
    pub quarters: u32,
    pub ones: u32,
    pub fives: u32,
    pub tens: u32,
    pub twenties: u32,
    pub fifties: u32,
    pub hundreds: u32,
}

impl DrawerCount {
    /// Total monetary value of the drawer.
    pub fn value(&self) -> Decimal {
        dec!(0.25) * Decimal::from(self.quarters)
            + Decimal::from(self.ones)
            + dec!(5) * Decimal::from(self.fives)
            + dec!(10) * Decimal::from(self.tens)
            + dec!(20) * Decimal::from(self.twenties)
            + dec!(50) * Decimal::from(self.fifties)
            + dec!(100) * Decimal::from(self.hundreds)
    }

    /// Total number of physical pieces in the drawer.
    pub fn piece_count(&self) -> u32 {
        self.quarters
            + self.ones
            + self.fives
            + self.tens
            + self.twenties
            + self.fifties
            + self.hundreds
    }
}
