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

//! Profit distribution records.
//!
//! A closed session's profit is handed out to programs in explicit
//! allocations. Distribution is re-invocable and the allocated sum is not
//! forced to match the session's profit — the remaining undistributed
//! amount is reported to the caller instead.

use crate::base::{ProgramId, SessionId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One requested allocation of session profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub program_id: ProgramId,
    pub amount: Decimal,
}

/// One recorded profit distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitDistribution {
    pub session_id: SessionId,
    pub program_id: ProgramId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Log of all profit distributions.
#[derive(Debug, Default)]
pub struct DistributionLog {
    records: Mutex<Vec<ProfitDistribution>>,
}

impl DistributionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, session_id: SessionId, allocation: Allocation) {
        self.records.lock().push(ProfitDistribution {
            session_id,
            program_id: allocation.program_id,
            amount: allocation.amount,
            created_at: Utc::now(),
        });
    }

    /// Everything distributed from one session so far.
    pub fn distributed_total(&self, session_id: SessionId) -> Decimal {
        self.records
            .lock()
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| r.amount)
            .sum()
    }

    pub fn for_session(&self, session_id: SessionId) -> Vec<ProfitDistribution> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ProfitDistribution> {
        self.records.lock().clone()
    }
}
