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

//! Concession session state machine.
//!
//! One session is one cash-drawer lifecycle:
//!
//! ```text
//! Created ──start──► Active ──close──► Closed
//!    │                  │
//!    └─────cancel───────┴──cancel──► Cancelled
//! ```
//!
//! No backward transitions. Profit is a cash-count fact
//! (`end_total - start_total`); it is never reconciled against the
//! session's recorded sales here — a large divergence is a signal for the
//! caller to record a loss, not an error.
//!
//! # Thread Safety
//!
//! All session state sits behind one [`Mutex`]. The engine holds that lock
//! across an entire order placement, so a transition cannot interleave
//! with an order being committed.

use crate::base::{ProgramId, SessionId};
use crate::error::LedgerError;
use crate::money::DrawerCount;
use crate::order::Order;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::Serialize;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Created,
    Active,
    Closed,
    Cancelled,
}

/// Result of closing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCloseout {
    pub end_total: Decimal,
    /// `end_total - start_total`, straight from the drawer counts.
    pub profit: Decimal,
    /// Derived sales figure, reported alongside profit so callers can spot
    /// divergence.
    pub sales_total: Decimal,
    pub discount_total: Decimal,
}

/// Point-in-time session view.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub name: String,
    pub program_id: ProgramId,
    pub status: SessionStatus,
    pub is_test: bool,
    pub start_total: Option<Decimal>,
    pub end_total: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub sales_total: Decimal,
    pub discount_total: Decimal,
    pub order_count: usize,
}

#[derive(Debug)]
pub(crate) struct SessionData {
    id: SessionId,
    name: String,
    program_id: ProgramId,
    status: SessionStatus,
    is_test: bool,
    opening_count: Option<DrawerCount>,
    closing_count: Option<DrawerCount>,
    start_total: Option<Decimal>,
    end_total: Option<Decimal>,
    profit: Option<Decimal>,
    sales_total: Decimal,
    discount_total: Decimal,
    orders: Vec<Order>,
    created_at: DateTime<Utc>,
}

impl SessionData {
    pub(crate) fn program_id(&self) -> ProgramId {
        self.program_id
    }

    pub(crate) fn is_test(&self) -> bool {
        self.is_test
    }

    pub(crate) fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.status == SessionStatus::Active {
            Ok(())
        } else {
            Err(LedgerError::WrongSessionState)
        }
    }

    /// Returns the counted profit of a closed session.
    pub(crate) fn ensure_closed(&self) -> Result<Decimal, LedgerError> {
        match (self.status, self.profit) {
            (SessionStatus::Closed, Some(profit)) => Ok(profit),
            _ => Err(LedgerError::WrongSessionState),
        }
    }

    /// Valid only from Created. Snapshots the opening drawer and
    /// activates.
    pub(crate) fn start(&mut self, count: DrawerCount) -> Result<Decimal, LedgerError> {
        if self.status != SessionStatus::Created {
            return Err(LedgerError::WrongSessionState);
        }
        let total = count.value();
        self.opening_count = Some(count);
        self.start_total = Some(total);
        self.status = SessionStatus::Active;
        Ok(total)
    }

    /// Valid only from Active. Snapshots the closing drawer and computes
    /// profit. Practice sessions discard their simulated orders here.
    pub(crate) fn close(&mut self, count: DrawerCount) -> Result<SessionCloseout, LedgerError> {
        if self.status != SessionStatus::Active {
            return Err(LedgerError::WrongSessionState);
        }
        let end_total = count.value();
        // start() is the only path to Active, so start_total is set.
        let start_total = self.start_total.unwrap_or(Decimal::ZERO);
        let profit = end_total - start_total;
        self.closing_count = Some(count);
        self.end_total = Some(end_total);
        self.profit = Some(profit);
        self.status = SessionStatus::Closed;
        if self.is_test {
            self.orders.clear();
        }
        Ok(SessionCloseout {
            end_total,
            profit,
            sales_total: self.sales_total,
            discount_total: self.discount_total,
        })
    }

    /// Valid from Created or Active, and only while no orders exist —
    /// there is no automatic reversal policy for in-flight orders.
    pub(crate) fn cancel(&mut self) -> Result<(), LedgerError> {
        match self.status {
            SessionStatus::Created | SessionStatus::Active => {}
            _ => return Err(LedgerError::WrongSessionState),
        }
        if !self.orders.is_empty() {
            return Err(LedgerError::SessionHasOrders);
        }
        self.status = SessionStatus::Cancelled;
        Ok(())
    }

    /// Records a committed order and rolls its totals into the session.
    pub(crate) fn record_order(&mut self, order: Order) {
        self.sales_total += order.final_total();
        self.discount_total += order.discount_amount;
        self.orders.push(order);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            name: self.name.clone(),
            program_id: self.program_id,
            status: self.status,
            is_test: self.is_test,
            start_total: self.start_total,
            end_total: self.end_total,
            profit: self.profit,
            sales_total: self.sales_total,
            discount_total: self.discount_total,
            order_count: self.orders.len(),
        }
    }
}

/// A concession session (one drawer lifecycle) and its owned orders.
#[derive(Debug)]
pub struct Session {
    inner: Mutex<SessionData>,
}

impl Session {
    pub(crate) fn new(id: SessionId, name: &str, program_id: ProgramId, is_test: bool) -> Self {
        Self {
            inner: Mutex::new(SessionData {
                id,
                name: name.to_string(),
                program_id,
                status: SessionStatus::Created,
                is_test,
                opening_count: None,
                closing_count: None,
                start_total: None,
                end_total: None,
                profit: None,
                sales_total: Decimal::ZERO,
                discount_total: Decimal::ZERO,
                orders: Vec::new(),
                created_at: Utc::now(),
            }),
        }
    }

    /// Locks the session for a compound operation (order placement holds
    /// this across inventory work; lock order is always session before
    /// item).
    pub(crate) fn begin(&self) -> MutexGuard<'_, SessionData> {
        self.inner.lock()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock().status
    }

    pub fn is_test(&self) -> bool {
        self.inner.lock().is_test
    }

    pub fn profit(&self) -> Option<Decimal> {
        self.inner.lock().profit
    }

    pub fn sales_total(&self) -> Decimal {
        self.inner.lock().sales_total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.lock().created_at
    }

    /// The drawer as counted at start, if the session has started.
    pub fn opening_count(&self) -> Option<DrawerCount> {
        self.inner.lock().opening_count
    }

    /// The drawer as counted at close, if the session has closed.
    pub fn closing_count(&self) -> Option<DrawerCount> {
        self.inner.lock().closing_count
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    /// The session's recorded orders, oldest first.
    pub fn orders(&self) -> Vec<Order> {
        self.inner.lock().orders.clone()
    }
}
