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

//! Sponsoring-program account ledger.
//!
//! Each program (band, robotics, drama, ...) carries a balance moved by
//! manual deposits/withdrawals, discount/comp charge-backs from orders,
//! and profit distributions from closed sessions.
//!
//! Charges may overdraw — a program can owe the club for the comps it
//! sponsored. Manual withdrawals may not.

use crate::base::{ProgramId, SessionId};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

/// Why a program's balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramTxKind {
    Deposit,
    Withdrawal,
    DiscountCharge,
    Distribution,
}

/// One signed movement on a program account.
///
/// `session_id == None` marks a manual (non-session) transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramTransaction {
    pub program_id: ProgramId,
    pub session_id: Option<SessionId>,
    pub amount: Decimal,
    pub kind: ProgramTxKind,
    pub created_at: DateTime<Utc>,
}

/// Point-in-time program view.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramSnapshot {
    pub id: ProgramId,
    pub name: String,
    pub balance: Decimal,
    pub active: bool,
    pub transaction_count: usize,
}

#[derive(Debug)]
struct ProgramData {
    id: ProgramId,
    name: String,
    balance: Decimal,
    active: bool,
    transactions: Vec<ProgramTransaction>,
}

impl ProgramData {
    fn apply(&mut self, amount: Decimal, kind: ProgramTxKind, session_id: Option<SessionId>) {
        self.balance += amount;
        self.transactions.push(ProgramTransaction {
            program_id: self.id,
            session_id,
            amount,
            kind,
            created_at: Utc::now(),
        });
    }

    fn snapshot(&self) -> ProgramSnapshot {
        ProgramSnapshot {
            id: self.id,
            name: self.name.clone(),
            balance: self.balance,
            active: self.active,
            transaction_count: self.transactions.len(),
        }
    }
}

/// A single program account.
#[derive(Debug)]
pub struct ProgramAccount {
    inner: Mutex<ProgramData>,
}

/// Ledger of all program accounts.
#[derive(Debug)]
pub struct ProgramLedger {
    accounts: DashMap<ProgramId, ProgramAccount>,
    next_id: AtomicU32,
}

impl Default for ProgramLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramLedger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Registers a new active program and returns its id.
    pub fn register(&self, name: &str) -> ProgramId {
        let id = ProgramId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.accounts.insert(
            id,
            ProgramAccount {
                inner: Mutex::new(ProgramData {
                    id,
                    name: name.to_string(),
                    balance: Decimal::ZERO,
                    active: true,
                    transactions: Vec::new(),
                }),
            },
        );
        id
    }

    /// Marks a program inactive. Its balance and history remain readable.
    pub fn deactivate(&self, id: ProgramId) -> Result<(), LedgerError> {
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        account.inner.lock().active = false;
        Ok(())
    }

    /// Fails unless the program exists and is active.
    pub fn ensure_active(&self, id: ProgramId) -> Result<(), LedgerError> {
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        if account.inner.lock().active {
            Ok(())
        } else {
            Err(LedgerError::InactiveProgram(id))
        }
    }

    /// Credits a manual or session deposit. Returns the new balance.
    pub fn deposit(
        &self,
        id: ProgramId,
        amount: Decimal,
        session_id: Option<SessionId>,
    ) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        let mut data = account.inner.lock();
        data.apply(amount, ProgramTxKind::Deposit, session_id);
        Ok(data.balance)
    }

    /// Debits a manual withdrawal. Refused beyond the balance.
    pub fn withdraw(&self, id: ProgramId, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        let mut data = account.inner.lock();
        if data.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        data.apply(-amount, ProgramTxKind::Withdrawal, None);
        Ok(data.balance)
    }

    /// Charges a discount/comp back to the program. May overdraw.
    pub fn charge(
        &self,
        id: ProgramId,
        amount: Decimal,
        session_id: Option<SessionId>,
    ) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        let mut data = account.inner.lock();
        data.apply(-amount, ProgramTxKind::DiscountCharge, session_id);
        Ok(data.balance)
    }

    /// Credits a share of a closed session's profit.
    pub fn credit_distribution(
        &self,
        id: ProgramId,
        amount: Decimal,
        session_id: SessionId,
    ) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        let mut data = account.inner.lock();
        data.apply(amount, ProgramTxKind::Distribution, Some(session_id));
        Ok(data.balance)
    }

    pub fn balance(&self, id: ProgramId) -> Result<Decimal, LedgerError> {
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        let balance = account.inner.lock().balance;
        Ok(balance)
    }

    /// A program's transaction history, oldest first.
    pub fn transactions(&self, id: ProgramId) -> Result<Vec<ProgramTransaction>, LedgerError> {
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        let transactions = account.inner.lock().transactions.clone();
        Ok(transactions)
    }

    pub fn snapshot(&self, id: ProgramId) -> Result<ProgramSnapshot, LedgerError> {
        let account = self.accounts.get(&id).ok_or(LedgerError::UnknownProgram(id))?;
        let snapshot = account.inner.lock().snapshot();
        Ok(snapshot)
    }

    /// Snapshots of every program, ordered by id.
    pub fn snapshots(&self) -> Vec<ProgramSnapshot> {
        let mut all: Vec<ProgramSnapshot> = self
            .accounts
            .iter()
            .map(|entry| entry.inner.lock().snapshot())
            .collect();
        all.sort_by_key(|s| s.id);
        all
    }
}
