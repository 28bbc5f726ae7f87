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

//! CashApp settlement balance.
//!
//! The club runs one CashApp account: order payments credit it, manual
//! withdrawals (cashing out to the bank) debit it.

use crate::error::LedgerError;
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// Running CashApp balance.
#[derive(Debug, Default)]
pub struct CashAppLedger {
    balance: Mutex<Decimal>,
}

impl CashAppLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits an order payment. Returns the new balance.
    ///
    /// Callers pass positive amounts; zero-total (comp) orders are not
    /// credited at all.
    pub(crate) fn credit(&self, amount: Decimal) -> Decimal {
        debug_assert!(amount > Decimal::ZERO);
        let mut balance = self.balance.lock();
        *balance += amount;
        *balance
    }

    /// Debits a manual withdrawal. Refused beyond the balance.
    pub fn withdraw(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let mut balance = self.balance.lock();
        if *balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        *balance -= amount;
        Ok(*balance)
    }

    pub fn balance(&self) -> Decimal {
        *self.balance.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn credit_then_withdraw() {
        let ledger = CashAppLedger::new();
        assert_eq!(ledger.credit(dec!(12.50)), dec!(12.50));
        assert_eq!(ledger.withdraw(dec!(10.00)), Ok(dec!(2.50)));
    }

    #[test]
    fn withdraw_beyond_balance_refused() {
        let ledger = CashAppLedger::new();
        ledger.credit(dec!(5.00));
        assert_eq!(
            ledger.withdraw(dec!(6.00)),
            Err(LedgerError::InsufficientFunds)
        );
        assert_eq!(ledger.balance(), dec!(5.00));
    }

    #[test]
    fn withdraw_requires_positive_amount() {
        let ledger = CashAppLedger::new();
        assert_eq!(
            ledger.withdraw(Decimal::ZERO),
            Err(LedgerError::InvalidAmount)
        );
    }
}
