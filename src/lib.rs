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

//! # Concession Ledger
//!
//! The financial core behind a school-club concession stand: cash-drawer
//! session accounting, lot-based (FIFO) inventory costing, composite-item
//! decomposition, purchase overhead allocation, discount/comp charge-back
//! to sponsoring programs, and profit distribution.
//!
//! ## Core Components
//!
//! - [`Engine`]: operation surface the POS layer calls
//! - [`InventoryLedger`]: per-item FIFO lots with all-or-nothing consumption
//! - [`Session`]: cash-drawer lifecycle (created → active → closed/cancelled)
//! - [`ProgramLedger`]: sponsoring-program balances and charge-backs
//! - [`LedgerError`]: typed failures; consistency errors roll back first
//!
//! ## Example
//!
//! ```
//! use concession_ledger_rs::{
//!     CatalogItem, DrawerCount, Engine, ItemId, OrderLineInput, OrderRequest,
//! };
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let program = engine.register_program("Robotics");
//! engine.upsert_item(CatalogItem::sellable(ItemId(1), "Water", dec!(1.00)));
//! engine
//!     .record_stock_update(ItemId(1), 24, dec!(0.25), chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
//!     .unwrap();
//!
//! let session = engine.create_session("Friday game", program, false).unwrap();
//! engine.start_session(session, DrawerCount { twenties: 2, tens: 1, ..DrawerCount::default() }).unwrap();
//!
//! let receipt = engine
//!     .place_order(session, OrderRequest::cash(vec![OrderLineInput::new(ItemId(1), 2)], dec!(5.00)))
//!     .unwrap();
//! assert_eq!(receipt.final_total, dec!(2.00));
//! assert_eq!(receipt.change_given, dec!(3.00));
//! assert_eq!(engine.on_hand(ItemId(1)), 22);
//! ```
//!
//! ## Thread Safety
//!
//! Orders from multiple terminals are safe against the same session and
//! shared inventory: per-item locks make check-then-deduct atomic, the
//! session lock spans a whole order placement, and every failure path
//! restores what it already took.

pub mod base;
pub mod cashapp;
pub mod catalog;
pub mod composite;
pub mod distribution;
mod engine;
pub mod error;
pub mod inventory;
pub mod journal;
pub mod loss;
pub mod money;
pub mod order;
pub mod program;
pub mod purchase;
pub mod reimbursement;
pub mod session;

pub use base::{ItemId, LossId, LotId, OrderId, PostingId, ProgramId, PurchaseId, SessionId};
pub use cashapp::CashAppLedger;
pub use catalog::{Catalog, CatalogItem};
pub use composite::CompositeResolver;
pub use distribution::{Allocation, DistributionLog, ProfitDistribution};
pub use engine::{Engine, InventoryAdjustment, PurchaseInput, PurchaseReceipt};
pub use error::LedgerError;
pub use inventory::{Adjustment, InventoryLedger, Lot, LotConsumption, LotSnapshot, StockSnapshot};
pub use journal::{Posting, PostingDetail, PostingJournal};
pub use loss::{Loss, LossKind, LossRecorder};
pub use money::DrawerCount;
pub use order::{
    ChargeTarget, Order, OrderLine, OrderLineInput, OrderReceipt, OrderRequest, PaymentMethod,
};
pub use program::{ProgramLedger, ProgramSnapshot, ProgramTransaction, ProgramTxKind};
pub use purchase::{LineCost, Purchase, PurchaseLine, allocate_line_costs};
pub use reimbursement::{CostSplit, ReimbursementTracker};
pub use session::{Session, SessionCloseout, SessionSnapshot, SessionStatus};
