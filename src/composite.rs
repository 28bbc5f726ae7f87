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

//! Composite-item decomposition.
//!
//! A composite menu item holds no lots of its own: selling one expands the
//! component list and consumes each component's inventory. Partial
//! composite sales are not allowed — if any component lacks stock, every
//! component already drained by this resolution is credited back to its
//! original lots before the error surfaces.

use crate::base::ItemId;
use crate::catalog::Catalog;
use crate::error::LedgerError;
use crate::inventory::{InventoryLedger, LotConsumption};

/// Resolves composite items into component lot consumptions.
///
/// Borrowed view over the catalog and the inventory ledger; construct one
/// per resolution.
pub struct CompositeResolver<'a> {
    catalog: &'a Catalog,
    inventory: &'a InventoryLedger,
}

impl<'a> CompositeResolver<'a> {
    pub fn new(catalog: &'a Catalog, inventory: &'a InventoryLedger) -> Self {
        Self { catalog, inventory }
    }

    /// Consumes `quantity` units of `item`, decomposing composites
    /// (recursively) and bypassing untracked items.
    ///
    /// All-or-nothing: on any [`LedgerError::InsufficientStock`] the
    /// consumptions already made by this call are restored exactly.
    pub fn consume(
        &self,
        item: ItemId,
        quantity: u32,
    ) -> Result<Vec<LotConsumption>, LedgerError> {
        let entry = self
            .catalog
            .get(item)
            .ok_or(LedgerError::UnknownItem(item))?;

        if !entry.is_composite() {
            if !entry.track_inventory {
                // Untracked items bypass lot math entirely.
                return Ok(Vec::new());
            }
            return self.inventory.consume(item, quantity);
        }

        let mut taken = Vec::new();
        for &(component, per_unit) in &entry.components {
            match self.consume(component, per_unit * quantity) {
                Ok(mut consumed) => taken.append(&mut consumed),
                Err(e) => {
                    self.inventory.restore(&taken);
                    return Err(e);
                }
            }
        }
        Ok(taken)
    }
}
