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

//! Error types for the concessions ledger.
//!
//! Validation errors reject an operation before anything is mutated.
//! Consistency errors ([`LedgerError::InsufficientStock`],
//! [`LedgerError::CannotReverseConsumedLot`]) are returned only after any
//! partial side effects have been rolled back.

use crate::base::{ItemId, LotId, ProgramId, PurchaseId, SessionId};
use thiserror::Error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Order has no line items
    #[error("order has no line items")]
    EmptyOrder,

    /// A line item or adjustment has a zero quantity
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Discount is negative, exceeds the subtotal, or a comp order's
    /// discount does not equal the subtotal
    #[error("invalid discount amount")]
    InvalidDiscount,

    /// Cash tendered is less than the order total
    #[error("amount tendered is less than the order total")]
    InsufficientTender,

    /// Session is not in a valid state for this operation
    #[error("session is not in a valid state for this operation")]
    WrongSessionState,

    /// Session still owns orders and cannot be cancelled
    #[error("session has recorded orders and cannot be cancelled")]
    SessionHasOrders,

    /// Not enough stock across an item's lots to satisfy a consumption
    #[error("insufficient stock for item {0}")]
    InsufficientStock(ItemId),

    /// A lot created by a purchase was already partially consumed and
    /// cannot be reversed
    #[error("lot {0} has been partially consumed and cannot be reversed")]
    CannotReverseConsumedLot(LotId),

    /// Item id is not present in the catalog
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    /// Item has no price and no override was supplied
    #[error("item {0} has no price")]
    UnpricedItem(ItemId),

    /// Session id does not exist
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// Program id does not exist
    #[error("unknown program {0}")]
    UnknownProgram(ProgramId),

    /// Program exists but has been deactivated
    #[error("program {0} is inactive")]
    InactiveProgram(ProgramId),

    /// Purchase id does not exist
    #[error("unknown purchase {0}")]
    UnknownPurchase(PurchaseId),

    /// Withdrawal would exceed the available balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Posting id already exists in the journal
    #[error("duplicate posting ID")]
    DuplicatePosting,
}
