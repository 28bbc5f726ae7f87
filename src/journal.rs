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

//! Thread-safe append-only posting journal.
//!
//! Every movement on the money ledgers (program charges and credits,
//! CashApp activity, Zelle settlements, losses) lands here as a
//! [`Posting`] for audit export. The journal combines a [`DashMap`] for
//! O(1) duplicate-id rejection with a [`SegQueue`] recording insertion
//! order. All operations are safe for concurrent access.

use crate::base::{LossId, OrderId, PostingId, ProgramId, SessionId};
use crate::error::LedgerError;
use crate::loss::LossKind;
use crate::program::ProgramTxKind;
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a posting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PostingDetail {
    Program {
        program_id: ProgramId,
        session_id: Option<SessionId>,
        kind: ProgramTxKind,
    },
    CashAppCredit {
        session_id: SessionId,
        order_id: OrderId,
    },
    CashAppWithdrawal,
    ZelleSettlement {
        session_id: SessionId,
        order_id: OrderId,
    },
    Loss {
        loss_id: LossId,
        kind: LossKind,
    },
}

/// One journaled ledger movement. Amounts are signed: credits positive,
/// charges and write-offs negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub id: PostingId,
    pub amount: Decimal,
    #[serde(flatten)]
    pub detail: PostingDetail,
    pub created_at: DateTime<Utc>,
}

/// Append-only journal with duplicate-id rejection.
#[derive(Debug)]
pub struct PostingJournal {
    /// Postings by id for O(1) duplicate detection and export.
    postings: DashMap<PostingId, Arc<Posting>>,
    /// Posting ids in insertion order.
    posting_ids: SegQueue<PostingId>,
    next_id: AtomicU64,
}

impl PostingJournal {
    pub fn new() -> Self {
        Self {
            postings: DashMap::new(),
            posting_ids: SegQueue::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Records a new posting, allocating its id. Infallible for callers
    /// that let the journal number its own entries.
    pub fn post(&self, amount: Decimal, detail: PostingDetail) -> PostingId {
        let id = PostingId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let posting = Arc::new(Posting {
            id,
            amount,
            detail,
            created_at: Utc::now(),
        });
        // Freshly allocated id; push cannot observe a duplicate.
        let _ = self.push(posting);
        id
    }

    /// Adds a pre-built posting.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicatePosting`] if a posting with the
    /// same id already exists.
    pub fn push(&self, posting: Arc<Posting>) -> Result<(), LedgerError> {
        let posting_id = posting.id;

        // Entry API for atomic check-and-insert.
        match self.postings.entry(posting_id) {
            Entry::Occupied(_) => Err(LedgerError::DuplicatePosting),
            Entry::Vacant(entry) => {
                entry.insert(posting);
                self.posting_ids.push(posting_id);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// All postings ordered by id (ids are allocated in posting order).
    pub fn snapshot(&self) -> Vec<Arc<Posting>> {
        let mut all: Vec<Arc<Posting>> = self
            .postings
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        all.sort_by_key(|p| p.id);
        all
    }
}

impl Default for PostingJournal {
    fn default() -> Self {
        Self::new()
    }
}
