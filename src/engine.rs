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

//! Concessions engine.
//!
//! The [`Engine`] wires the catalog, the FIFO inventory ledger, sessions,
//! program accounts, and the parallel cash ledgers into the operation
//! surface the POS layer calls. It owns id allocation and the posting
//! journal.
//!
//! # Atomicity
//!
//! One [`Engine::place_order`] call is the unit of atomicity: the session
//! lock is held across the whole call, per-item deductions happen under
//! per-item locks, and any failure restores every deduction the order
//! already made. An order can never be accepted once a close has begun
//! committing, and two orders racing for the last unit of stock cannot
//! both win.

use crate::base::{ItemId, LossId, LotId, OrderId, ProgramId, PurchaseId, SessionId};
use crate::cashapp::CashAppLedger;
use crate::catalog::{Catalog, CatalogItem};
use crate::composite::CompositeResolver;
use crate::distribution::{Allocation, DistributionLog, ProfitDistribution};
use crate::error::LedgerError;
use crate::inventory::{Adjustment, InventoryLedger, StockSnapshot};
use crate::journal::{Posting, PostingDetail, PostingJournal};
use crate::loss::{LossKind, LossRecorder};
use crate::money::DrawerCount;
use crate::order::{ChargeTarget, Order, OrderLine, OrderReceipt, OrderRequest, PaymentMethod};
use crate::program::{ProgramLedger, ProgramSnapshot, ProgramTransaction, ProgramTxKind};
use crate::purchase::{Purchase, PurchaseLine, allocate_line_costs};
use crate::reimbursement::{CostSplit, ReimbursementTracker};
use crate::session::{Session, SessionCloseout, SessionSnapshot};
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A vendor receipt as submitted for intake.
#[derive(Debug, Clone)]
pub struct PurchaseInput {
    pub vendor: String,
    pub date: NaiveDate,
    pub lines: Vec<PurchaseLine>,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub other_fees: Decimal,
    pub notes: Option<String>,
}

/// What intake produced: the purchase record plus its lots. A non-zero
/// `unlinked_lines` means some lines touched no inventory — callers
/// surface that as a confirmation.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub purchase_id: PurchaseId,
    pub lot_ids: Vec<LotId>,
    pub unlinked_lines: usize,
}

/// Result of a non-sale inventory adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryAdjustment {
    pub on_hand: u64,
    /// Cost of the written-off stock, split by reimbursability. Zero for
    /// recounts.
    pub write_off: CostSplit,
}

/// Central engine over all concession ledgers.
pub struct Engine {
    catalog: Catalog,
    inventory: InventoryLedger,
    sessions: DashMap<SessionId, Session>,
    programs: ProgramLedger,
    purchases: DashMap<PurchaseId, Purchase>,
    distributions: DistributionLog,
    reimbursement: ReimbursementTracker,
    cashapp: CashAppLedger,
    losses: LossRecorder,
    journal: PostingJournal,
    next_session_id: AtomicU64,
    next_order_id: AtomicU64,
    next_purchase_id: AtomicU64,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            catalog: Catalog::new(),
            inventory: InventoryLedger::new(),
            sessions: DashMap::new(),
            programs: ProgramLedger::new(),
            purchases: DashMap::new(),
            distributions: DistributionLog::new(),
            reimbursement: ReimbursementTracker::new(),
            cashapp: CashAppLedger::new(),
            losses: LossRecorder::new(),
            journal: PostingJournal::new(),
            next_session_id: AtomicU64::new(1),
            next_order_id: AtomicU64::new(1),
            next_purchase_id: AtomicU64::new(1),
        }
    }

    // === Catalog & programs (external collaborator data) ===

    /// Inserts or replaces a menu item definition.
    pub fn upsert_item(&self, item: CatalogItem) {
        self.catalog.upsert(item);
    }

    pub fn register_program(&self, name: &str) -> ProgramId {
        self.programs.register(name)
    }

    pub fn deactivate_program(&self, id: ProgramId) -> Result<(), LedgerError> {
        self.programs.deactivate(id)
    }

    // === Session lifecycle ===

    /// Creates a session in `Created` for an active program.
    pub fn create_session(
        &self,
        name: &str,
        program_id: ProgramId,
        is_test: bool,
    ) -> Result<SessionId, LedgerError> {
        self.programs.ensure_active(program_id)?;
        let id = SessionId(self.next_session_id.fetch_add(1, Ordering::Relaxed));
        self.sessions
            .insert(id, Session::new(id, name, program_id, is_test));
        Ok(id)
    }

    /// Counts the opening drawer in and activates the session.
    pub fn start_session(
        &self,
        session_id: SessionId,
        count: DrawerCount,
    ) -> Result<Decimal, LedgerError> {
        let session = self.session(session_id)?;
        let total = session.begin().start(count)?;
        Ok(total)
    }

    /// Counts the closing drawer and computes profit. Practice sessions
    /// drop their simulated orders here.
    pub fn close_session(
        &self,
        session_id: SessionId,
        count: DrawerCount,
    ) -> Result<SessionCloseout, LedgerError> {
        let session = self.session(session_id)?;
        let closeout = session.begin().close(count)?;
        Ok(closeout)
    }

    /// Cancels a session that has no orders. Nothing is reversed.
    pub fn cancel_session(&self, session_id: SessionId) -> Result<(), LedgerError> {
        let session = self.session(session_id)?;
        session.begin().cancel()
    }

    // === Orders ===

    /// Validates and applies a sale against an active session.
    ///
    /// See the module docs for the atomicity guarantees. Practice-session
    /// orders run the same validation and totaling but never touch
    /// inventory, program balances, CashApp, or reimbursement totals.
    pub fn place_order(
        &self,
        session_id: SessionId,
        request: OrderRequest,
    ) -> Result<OrderReceipt, LedgerError> {
        let session = self.session(session_id)?;
        let mut data = session.begin();
        data.ensure_active()?;

        if request.lines.is_empty() {
            return Err(LedgerError::EmptyOrder);
        }

        // Price every line from the catalog (explicit price wins).
        let mut lines = Vec::with_capacity(request.lines.len());
        for input in &request.lines {
            if input.quantity == 0 {
                return Err(LedgerError::InvalidQuantity);
            }
            let entry = self
                .catalog
                .get(input.item_id)
                .ok_or(LedgerError::UnknownItem(input.item_id))?;
            let unit_price = input
                .unit_price
                .or(entry.price)
                .ok_or(LedgerError::UnpricedItem(input.item_id))?;
            lines.push(OrderLine {
                item_id: input.item_id,
                quantity: input.quantity,
                unit_price,
            });
        }

        let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();
        let discount = request.discount_amount;
        if discount < Decimal::ZERO || discount > subtotal {
            return Err(LedgerError::InvalidDiscount);
        }
        if request.is_comp && discount != subtotal {
            return Err(LedgerError::InvalidDiscount);
        }

        // Resolve the charge-back target before any deduction so a bad
        // target never needs inventory rollback.
        let charge_program = match request.charged_to {
            ChargeTarget::Asb => None,
            ChargeTarget::Program(id) => {
                self.programs.ensure_active(id)?;
                Some(id)
            }
            ChargeTarget::SessionProgram => {
                let id = data.program_id();
                self.programs.ensure_active(id)?;
                Some(id)
            }
        };

        let final_total = subtotal - discount;
        let change_given = match request.payment {
            PaymentMethod::Cash => {
                if request.amount_tendered < final_total {
                    return Err(LedgerError::InsufficientTender);
                }
                request.amount_tendered - final_total
            }
            _ => Decimal::ZERO,
        };

        let is_test = data.is_test();
        let mut consumed = Vec::new();
        if !is_test {
            let resolver = CompositeResolver::new(&self.catalog, &self.inventory);
            for line in &lines {
                match resolver.consume(line.item_id, line.quantity) {
                    Ok(mut taken) => consumed.append(&mut taken),
                    Err(e) => {
                        // No partial sale: put back what this order took.
                        self.inventory.restore(&consumed);
                        return Err(e);
                    }
                }
            }

            if discount > Decimal::ZERO {
                if let Some(program_id) = charge_program {
                    if let Err(e) = self.programs.charge(program_id, discount, Some(session_id)) {
                        self.inventory.restore(&consumed);
                        return Err(e);
                    }
                    self.journal.post(
                        -discount,
                        PostingDetail::Program {
                            program_id,
                            session_id: Some(session_id),
                            kind: ProgramTxKind::DiscountCharge,
                        },
                    );
                }
            }
        }

        let order_id = OrderId(self.next_order_id.fetch_add(1, Ordering::Relaxed));

        if !is_test {
            self.reimbursement.record(&consumed);
            if final_total > Decimal::ZERO {
                match request.payment {
                    PaymentMethod::Cash => {} // stays in the drawer
                    PaymentMethod::CashApp => {
                        self.cashapp.credit(final_total);
                        self.journal.post(
                            final_total,
                            PostingDetail::CashAppCredit {
                                session_id,
                                order_id,
                            },
                        );
                    }
                    PaymentMethod::Zelle => {
                        // Settles outside the club's hands; journal only.
                        self.journal.post(
                            final_total,
                            PostingDetail::ZelleSettlement {
                                session_id,
                                order_id,
                            },
                        );
                    }
                }
            }
        }

        let order = Order {
            id: order_id,
            session_id,
            lines,
            payment: request.payment,
            amount_tendered: request.amount_tendered,
            change_given,
            subtotal,
            discount_amount: discount,
            charged_to: request.charged_to,
            is_comp: request.is_comp,
            is_test,
            created_at: chrono::Utc::now(),
        };
        data.record_order(order);

        Ok(OrderReceipt {
            order_id,
            subtotal,
            discount_amount: discount,
            final_total,
            change_given,
        })
    }

    // === Purchases & stock ===

    /// Intakes a vendor receipt: allocates overhead, creates a
    /// reimbursable lot per linked line, and records the purchase.
    pub fn create_purchase(&self, input: PurchaseInput) -> Result<PurchaseReceipt, LedgerError> {
        // Validate before creating any lot so intake is all-or-nothing.
        for line in &input.lines {
            if let Some(item_id) = line.item_id {
                if !self.catalog.contains(item_id) {
                    return Err(LedgerError::UnknownItem(item_id));
                }
                if line.quantity == 0 {
                    return Err(LedgerError::InvalidQuantity);
                }
            }
        }

        let overhead = input.tax + input.delivery_fee + input.other_fees;
        let costs = allocate_line_costs(&input.lines, overhead);

        let mut created_lots = Vec::new();
        let mut lot_ids = Vec::new();
        let mut unlinked_lines = 0;
        for (line, cost) in input.lines.iter().zip(costs.iter()) {
            let Some(item_id) = line.item_id else {
                unlinked_lines += 1;
                continue;
            };
            let tracked = self
                .catalog
                .get(item_id)
                .is_some_and(|entry| entry.track_inventory);
            if !tracked {
                continue;
            }
            let lot_id = self.inventory.receive(
                item_id,
                line.quantity,
                cost.unit_cost,
                true,
                input.date,
                Some(input.vendor.clone()),
            )?;
            created_lots.push((item_id, lot_id));
            lot_ids.push(lot_id);
        }

        let purchase_id = PurchaseId(self.next_purchase_id.fetch_add(1, Ordering::Relaxed));
        self.purchases.insert(
            purchase_id,
            Purchase {
                id: purchase_id,
                vendor: input.vendor,
                date: input.date,
                lines: input.lines,
                tax: input.tax,
                delivery_fee: input.delivery_fee,
                other_fees: input.other_fees,
                notes: input.notes,
                created_lots,
            },
        );

        Ok(PurchaseReceipt {
            purchase_id,
            lot_ids,
            unlinked_lines,
        })
    }

    /// Deletes a purchase by reversing the lots it created.
    ///
    /// Fails with [`LedgerError::CannotReverseConsumedLot`] — leaving
    /// every lot and the purchase untouched — if any of its lots has been
    /// consumed from.
    pub fn delete_purchase(&self, purchase_id: PurchaseId) -> Result<Vec<LotId>, LedgerError> {
        let (_, purchase) = self
            .purchases
            .remove(&purchase_id)
            .ok_or(LedgerError::UnknownPurchase(purchase_id))?;

        match self.inventory.reverse_lots(&purchase.created_lots) {
            Ok(()) => Ok(purchase.created_lots.iter().map(|&(_, lot)| lot).collect()),
            Err(e) => {
                // Reversal rolled itself back; restore the record too.
                self.purchases.insert(purchase_id, purchase);
                Err(e)
            }
        }
    }

    /// Manual stock update with no receipt: a non-reimbursable lot, no
    /// overhead math. Returns `None` for untracked items.
    pub fn record_stock_update(
        &self,
        item: ItemId,
        quantity: u32,
        unit_cost: Decimal,
        date: NaiveDate,
    ) -> Result<Option<LotId>, LedgerError> {
        let entry = self
            .catalog
            .get(item)
            .ok_or(LedgerError::UnknownItem(item))?;
        if !entry.track_inventory {
            return Ok(None);
        }
        let lot_id = self
            .inventory
            .receive(item, quantity, unit_cost, false, date, None)?;
        Ok(Some(lot_id))
    }

    /// Applies a non-sale adjustment. Write-offs are valued so the caller
    /// can record a matching loss; untracked items succeed untouched.
    pub fn adjust_inventory(
        &self,
        item: ItemId,
        adjustment: Adjustment,
    ) -> Result<InventoryAdjustment, LedgerError> {
        let entry = self
            .catalog
            .get(item)
            .ok_or(LedgerError::UnknownItem(item))?;
        if !entry.track_inventory {
            return Ok(InventoryAdjustment {
                on_hand: self.inventory.on_hand(item),
                write_off: CostSplit::default(),
            });
        }
        let (on_hand, consumed) = self.inventory.adjust(item, adjustment)?;
        let write_off = ReimbursementTracker::cost_of(&consumed);
        self.reimbursement.record(&consumed);
        Ok(InventoryAdjustment { on_hand, write_off })
    }

    // === Profit distribution ===

    /// Distributes a closed session's profit across programs and returns
    /// the remaining undistributed amount.
    ///
    /// Re-invocable; the sum is never forced to match the profit. A
    /// negative remainder means the session has been over-distributed —
    /// advisory, not an error.
    pub fn distribute_profit(
        &self,
        session_id: SessionId,
        allocations: &[Allocation],
    ) -> Result<Decimal, LedgerError> {
        let session = self.session(session_id)?;
        let data = session.begin();
        let profit = data.ensure_closed()?;

        // Validate every allocation before applying any.
        for allocation in allocations {
            if allocation.amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount);
            }
            self.programs.ensure_active(allocation.program_id)?;
        }

        for allocation in allocations {
            self.programs
                .credit_distribution(allocation.program_id, allocation.amount, session_id)?;
            self.journal.post(
                allocation.amount,
                PostingDetail::Program {
                    program_id: allocation.program_id,
                    session_id: Some(session_id),
                    kind: ProgramTxKind::Distribution,
                },
            );
            self.distributions.append(session_id, *allocation);
        }

        Ok(profit - self.distributions.distributed_total(session_id))
    }

    // === Losses & parallel ledgers ===

    /// Records a loss. References are stored as given.
    pub fn record_loss(
        &self,
        session_id: Option<SessionId>,
        program_id: Option<ProgramId>,
        kind: LossKind,
        amount: Decimal,
        description: &str,
    ) -> Result<LossId, LedgerError> {
        let loss_id = self
            .losses
            .record(session_id, program_id, kind, amount, description)?;
        self.journal
            .post(-amount, PostingDetail::Loss { loss_id, kind });
        Ok(loss_id)
    }

    pub fn program_deposit(
        &self,
        program_id: ProgramId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let balance = self.programs.deposit(program_id, amount, None)?;
        self.journal.post(
            amount,
            PostingDetail::Program {
                program_id,
                session_id: None,
                kind: ProgramTxKind::Deposit,
            },
        );
        Ok(balance)
    }

    pub fn program_withdraw(
        &self,
        program_id: ProgramId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let balance = self.programs.withdraw(program_id, amount)?;
        self.journal.post(
            -amount,
            PostingDetail::Program {
                program_id,
                session_id: None,
                kind: ProgramTxKind::Withdrawal,
            },
        );
        Ok(balance)
    }

    pub fn cashapp_withdraw(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        let balance = self.cashapp.withdraw(amount)?;
        self.journal.post(-amount, PostingDetail::CashAppWithdrawal);
        Ok(balance)
    }

    // === Reads ===

    /// Best-effort display read; `place_order` re-checks under lock.
    pub fn on_hand(&self, item: ItemId) -> u64 {
        self.inventory.on_hand(item)
    }

    pub fn stock_snapshot(&self, item: ItemId) -> StockSnapshot {
        self.inventory.snapshot(item)
    }

    pub fn session_snapshot(&self, session_id: SessionId) -> Result<SessionSnapshot, LedgerError> {
        let session = self.session(session_id)?;
        Ok(session.snapshot())
    }

    /// A session's recorded orders, oldest first.
    pub fn session_orders(&self, session_id: SessionId) -> Result<Vec<Order>, LedgerError> {
        let session = self.session(session_id)?;
        Ok(session.orders())
    }

    pub fn program_balance(&self, program_id: ProgramId) -> Result<Decimal, LedgerError> {
        self.programs.balance(program_id)
    }

    pub fn program_snapshot(&self, program_id: ProgramId) -> Result<ProgramSnapshot, LedgerError> {
        self.programs.snapshot(program_id)
    }

    pub fn program_snapshots(&self) -> Vec<ProgramSnapshot> {
        self.programs.snapshots()
    }

    pub fn program_transactions(
        &self,
        program_id: ProgramId,
    ) -> Result<Vec<ProgramTransaction>, LedgerError> {
        self.programs.transactions(program_id)
    }

    pub fn cashapp_balance(&self) -> Decimal {
        self.cashapp.balance()
    }

    pub fn reimbursement_totals(&self) -> CostSplit {
        self.reimbursement.totals()
    }

    pub fn loss_total(&self, kind: LossKind) -> Decimal {
        self.losses.total_for(kind)
    }

    pub fn losses(&self) -> Vec<crate::loss::Loss> {
        self.losses.snapshot()
    }

    pub fn distributions_for(&self, session_id: SessionId) -> Vec<ProfitDistribution> {
        self.distributions.for_session(session_id)
    }

    /// Audit journal in posting order.
    pub fn journal_snapshot(&self) -> Vec<Arc<Posting>> {
        self.journal.snapshot()
    }

    fn session(
        &self,
        session_id: SessionId,
    ) -> Result<dashmap::mapref::one::Ref<'_, SessionId, Session>, LedgerError> {
        self.sessions
            .get(&session_id)
            .ok_or(LedgerError::UnknownSession(session_id))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
