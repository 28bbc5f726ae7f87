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

//! Loss write-offs: shrink, spoilage, and count discrepancies.
//!
//! Losses are advisory bookkeeping recorded by callers — typically after a
//! cash count diverges from recorded sales, or after an inventory
//! write-off is valued. Session and program references are stored as
//! given.

use crate::base::{LossId, ProgramId, SessionId};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Loss taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    CashDiscrepancy,
    InventoryDiscrepancy,
    Spoilage,
    Other,
}

/// One recorded loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loss {
    pub id: LossId,
    pub session_id: Option<SessionId>,
    pub program_id: Option<ProgramId>,
    pub kind: LossKind,
    pub amount: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only loss log.
#[derive(Debug)]
pub struct LossRecorder {
    losses: Mutex<Vec<Loss>>,
    next_id: AtomicU64,
}

impl Default for LossRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl LossRecorder {
    pub fn new() -> Self {
        Self {
            losses: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Records a loss and returns its id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] for a zero or negative amount.
    pub fn record(
        &self,
        session_id: Option<SessionId>,
        program_id: Option<ProgramId>,
        kind: LossKind,
        amount: Decimal,
        description: &str,
    ) -> Result<LossId, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let id = LossId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.losses.lock().push(Loss {
            id,
            session_id,
            program_id,
            kind,
            amount,
            description: description.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    /// Total written off under one kind.
    pub fn total_for(&self, kind: LossKind) -> Decimal {
        self.losses
            .lock()
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.amount)
            .sum()
    }

    /// Total written off across all kinds.
    pub fn total(&self) -> Decimal {
        self.losses.lock().iter().map(|l| l.amount).sum()
    }

    pub fn snapshot(&self) -> Vec<Loss> {
        self.losses.lock().clone()
    }
}
