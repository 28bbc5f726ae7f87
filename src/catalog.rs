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

//! Menu-item catalog.
//!
//! The catalog is external collaborator data: a flat map from item id to
//! its sale-relevant record plus the component list for composites. Menu
//! presentation (grid placement, category trees, sub-item nesting) has no
//! analog here.

use crate::base::ItemId;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sellable or stockable catalog entry.
///
/// `price == None` marks an unsellable row (category container or supply).
/// A non-empty `components` list makes the item composite: it holds no
/// lots of its own and decomposes into component consumptions at sale
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub price: Option<Decimal>,
    pub track_inventory: bool,
    pub is_supply: bool,
    /// `(component item id, per-unit quantity)`, in recipe order.
    pub components: Vec<(ItemId, u32)>,
}

impl CatalogItem {
    /// Plain tracked item with a price.
    pub fn sellable(id: ItemId, name: &str, price: Decimal) -> Self {
        Self {
            id,
            name: name.to_string(),
            price: Some(price),
            track_inventory: true,
            is_supply: false,
            components: Vec::new(),
        }
    }

    /// Supply row: stocked and costed but not sold on its own.
    pub fn supply(id: ItemId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            price: None,
            track_inventory: true,
            is_supply: true,
            components: Vec::new(),
        }
    }

    /// Composite item built from component inventory at sale time.
    pub fn composite(id: ItemId, name: &str, price: Decimal, components: Vec<(ItemId, u32)>) -> Self {
        Self {
            id,
            name: name.to_string(),
            price: Some(price),
            track_inventory: false,
            is_supply: false,
            components,
        }
    }

    pub fn is_composite(&self) -> bool {
        !self.components.is_empty()
    }
}

/// Flat item catalog keyed by id.
#[derive(Debug, Default)]
pub struct Catalog {
    items: DashMap<ItemId, CatalogItem>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Inserts or replaces a catalog entry.
    pub fn upsert(&self, item: CatalogItem) {
        self.items.insert(item.id, item);
    }

    /// Looks up an entry by id. Entries are small; lookups clone.
    pub fn get(&self, id: ItemId) -> Option<CatalogItem> {
        self.items.get(&id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
