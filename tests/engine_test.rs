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

//! Engine public API integration tests.

use chrono::NaiveDate;
use concession_ledger_rs::{
    Adjustment, Allocation, CatalogItem, ChargeTarget, DrawerCount, Engine, ItemId, LedgerError,
    LossKind, OrderLineInput, OrderRequest, PaymentMethod, ProgramId, PurchaseInput, PurchaseLine,
    SessionStatus,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;

const WATER: ItemId = ItemId(1);
const CANDY: ItemId = ItemId(2);
const CHIPS: ItemId = ItemId(3);
const CHEESE: ItemId = ItemId(4);
const NACHOS: ItemId = ItemId(10);

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn drawer(quarters: u32, ones: u32, fives: u32, tens: u32, twenties: u32) -> DrawerCount {
    DrawerCount {
        quarters,
        ones,
        fives,
        tens,
        twenties,
        ..DrawerCount::default()
    }
}

/// Engine with a small menu and a registered program.
fn setup() -> (Engine, ProgramId) {
    let engine = Engine::new();
    engine.upsert_item(CatalogItem::sellable(WATER, "Water", dec!(1.00)));
    engine.upsert_item(CatalogItem::sellable(CANDY, "Candy", dec!(1.50)));
    engine.upsert_item(CatalogItem::supply(CHIPS, "Chips"));
    engine.upsert_item(CatalogItem::supply(CHEESE, "Cheese"));
    engine.upsert_item(CatalogItem::composite(
        NACHOS,
        "Nachos",
        dec!(4.00),
        vec![(CHIPS, 1), (CHEESE, 2)],
    ));
    let program = engine.register_program("Robotics");
    (engine, program)
}

fn stock(engine: &Engine, item: ItemId, qty: u32, unit_cost: Decimal) {
    engine
        .record_stock_update(item, qty, unit_cost, date(2026, 3, 1))
        .unwrap();
}

/// Creates and starts a session with a $50.00 opening bank.
fn active_session(engine: &Engine, program: ProgramId) -> concession_ledger_rs::SessionId {
    let session = engine.create_session("Friday game", program, false).unwrap();
    let start = engine
        .start_session(session, drawer(20, 15, 4, 1, 0))
        .unwrap();
    assert_eq!(start, dec!(50.00));
    session
}

// === Session lifecycle ===

#[test]
fn session_profit_is_a_cash_count_fact() {
    let (engine, program) = setup();
    let session = active_session(&engine, program);

    // $73.25 at close: 21 quarters, 18 ones, 4 fives, 1 ten, 1 twenty.
    let closeout = engine
        .close_session(session, drawer(21, 18, 4, 1, 1))
        .unwrap();
    assert_eq!(closeout.end_total, dec!(73.25));
    assert_eq!(closeout.profit, dec!(23.25));
}

#[test]
fn create_session_requires_known_active_program() {
    let (engine, program) = setup();
    assert_eq!(
        engine.create_session("x", ProgramId(404), false),
        Err(LedgerError::UnknownProgram(ProgramId(404)))
    );

    engine.deactivate_program(program).unwrap();
    assert_eq!(
        engine.create_session("x", program, false),
        Err(LedgerError::InactiveProgram(program))
    );
}

#[test]
fn transitions_are_one_directional() {
    let (engine, program) = setup();
    let session = engine.create_session("s", program, false).unwrap();

    // Close before start.
    assert_eq!(
        engine.close_session(session, DrawerCount::default()),
        Err(LedgerError::WrongSessionState)
    );

    engine.start_session(session, DrawerCount::default()).unwrap();
    engine.close_session(session, DrawerCount::default()).unwrap();

    // No reopening, no cancelling a closed session.
    assert_eq!(
        engine.start_session(session, DrawerCount::default()),
        Err(LedgerError::WrongSessionState)
    );
    assert_eq!(
        engine.cancel_session(session),
        Err(LedgerError::WrongSessionState)
    );
}

#[test]
fn cancel_is_refused_once_orders_exist() {
    let (engine, program) = setup();
    stock(&engine, WATER, 10, dec!(0.25));
    let session = active_session(&engine, program);

    engine
        .place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::new(WATER, 1)], dec!(1.00)),
        )
        .unwrap();

    assert_eq!(
        engine.cancel_session(session),
        Err(LedgerError::SessionHasOrders)
    );

    // A fresh session cancels fine from Created or Active.
    let fresh = engine.create_session("empty", program, false).unwrap();
    engine.cancel_session(fresh).unwrap();
    assert_eq!(
        engine.session_snapshot(fresh).unwrap().status,
        SessionStatus::Cancelled
    );
}

// === Orders ===

#[test]
fn cash_order_computes_change_and_decrements_stock() {
    let (engine, program) = setup();
    stock(&engine, WATER, 24, dec!(0.25));
    let session = active_session(&engine, program);

    let receipt = engine
        .place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::new(WATER, 2)], dec!(5.00)),
        )
        .unwrap();

    assert_eq!(receipt.subtotal, dec!(2.00));
    assert_eq!(receipt.final_total, dec!(2.00));
    assert_eq!(receipt.change_given, dec!(3.00));
    assert_eq!(engine.on_hand(WATER), 22);

    let snapshot = engine.session_snapshot(session).unwrap();
    assert_eq!(snapshot.sales_total, dec!(2.00));
    assert_eq!(snapshot.order_count, 1);

    let orders = engine.session_orders(session).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].lines[0].quantity, 2);
    assert_eq!(orders[0].final_total(), dec!(2.00));
}

#[test]
fn order_requires_active_session_and_lines() {
    let (engine, program) = setup();
    let session = engine.create_session("s", program, false).unwrap();

    let request = OrderRequest::cash(vec![OrderLineInput::new(WATER, 1)], dec!(1.00));
    assert_eq!(
        engine.place_order(session, request),
        Err(LedgerError::WrongSessionState)
    );

    engine.start_session(session, DrawerCount::default()).unwrap();
    assert_eq!(
        engine.place_order(session, OrderRequest::default()),
        Err(LedgerError::EmptyOrder)
    );
}

#[test]
fn insufficient_tender_is_rejected() {
    let (engine, program) = setup();
    stock(&engine, CANDY, 10, dec!(0.50));
    let session = active_session(&engine, program);

    let result = engine.place_order(
        session,
        OrderRequest::cash(vec![OrderLineInput::new(CANDY, 2)], dec!(2.00)),
    );
    assert_eq!(result, Err(LedgerError::InsufficientTender));
    // Nothing consumed.
    assert_eq!(engine.on_hand(CANDY), 10);
}

#[test]
fn discount_must_stay_within_subtotal() {
    let (engine, program) = setup();
    stock(&engine, WATER, 10, dec!(0.25));
    let session = active_session(&engine, program);

    let mut request = OrderRequest::cash(vec![OrderLineInput::new(WATER, 2)], dec!(5.00));
    request.discount_amount = dec!(2.50);
    assert_eq!(
        engine.place_order(session, request),
        Err(LedgerError::InvalidDiscount)
    );

    let mut negative = OrderRequest::cash(vec![OrderLineInput::new(WATER, 2)], dec!(5.00));
    negative.discount_amount = dec!(-1.00);
    assert_eq!(
        engine.place_order(session, negative),
        Err(LedgerError::InvalidDiscount)
    );
}

#[test]
fn comp_requires_full_discount_and_totals_zero() {
    let (engine, program) = setup();
    stock(&engine, CANDY, 10, dec!(0.50));
    let session = active_session(&engine, program);

    let mut partial = OrderRequest::cash(vec![OrderLineInput::new(CANDY, 2)], Decimal::ZERO);
    partial.is_comp = true;
    partial.discount_amount = dec!(1.00);
    assert_eq!(
        engine.place_order(session, partial),
        Err(LedgerError::InvalidDiscount)
    );

    let mut comp = OrderRequest::cash(vec![OrderLineInput::new(CANDY, 2)], Decimal::ZERO);
    comp.is_comp = true;
    comp.discount_amount = dec!(3.00);
    let receipt = engine.place_order(session, comp).unwrap();
    assert_eq!(receipt.final_total, Decimal::ZERO);
    assert_eq!(receipt.change_given, Decimal::ZERO);
    // Inventory still moves for a comp.
    assert_eq!(engine.on_hand(CANDY), 8);
}

#[test]
fn discount_charges_back_to_named_program() {
    let (engine, program) = setup();
    let sponsor = engine.register_program("Band");
    stock(&engine, WATER, 10, dec!(0.25));
    let session = active_session(&engine, program);

    let mut request = OrderRequest::cash(vec![OrderLineInput::new(WATER, 4)], dec!(10.00));
    request.discount_amount = dec!(1.50);
    request.charged_to = ChargeTarget::Program(sponsor);
    let receipt = engine.place_order(session, request).unwrap();

    assert_eq!(receipt.final_total, dec!(2.50));
    // The sponsor absorbed the discount, overdrawing its empty account.
    assert_eq!(engine.program_balance(sponsor), Ok(dec!(-1.50)));
    // The hosting program is untouched.
    assert_eq!(engine.program_balance(program), Ok(Decimal::ZERO));
}

#[test]
fn asb_discount_charges_no_program() {
    let (engine, program) = setup();
    stock(&engine, WATER, 10, dec!(0.25));
    let session = active_session(&engine, program);

    let mut request = OrderRequest::cash(vec![OrderLineInput::new(WATER, 2)], dec!(5.00));
    request.discount_amount = dec!(0.50);
    // charged_to defaults to Asb.
    engine.place_order(session, request).unwrap();

    assert_eq!(engine.program_balance(program), Ok(Decimal::ZERO));
    assert!(engine.program_transactions(program).unwrap().is_empty());
}

#[test]
fn session_program_target_resolves_to_host() {
    let (engine, program) = setup();
    stock(&engine, WATER, 10, dec!(0.25));
    let session = active_session(&engine, program);

    let mut comp = OrderRequest::cash(vec![OrderLineInput::new(WATER, 2)], Decimal::ZERO);
    comp.is_comp = true;
    comp.discount_amount = dec!(2.00);
    comp.charged_to = ChargeTarget::SessionProgram;
    engine.place_order(session, comp).unwrap();

    assert_eq!(engine.program_balance(program), Ok(dec!(-2.00)));
}

#[test]
fn unknown_charge_target_rejected_before_consumption() {
    let (engine, program) = setup();
    stock(&engine, WATER, 10, dec!(0.25));
    let session = active_session(&engine, program);

    let mut request = OrderRequest::cash(vec![OrderLineInput::new(WATER, 2)], dec!(5.00));
    request.discount_amount = dec!(0.50);
    request.charged_to = ChargeTarget::Program(ProgramId(404));
    assert_eq!(
        engine.place_order(session, request),
        Err(LedgerError::UnknownProgram(ProgramId(404)))
    );
    assert_eq!(engine.on_hand(WATER), 10);
}

#[test]
fn multi_line_order_is_all_or_nothing() {
    let (engine, program) = setup();
    stock(&engine, WATER, 10, dec!(0.25));
    stock(&engine, CANDY, 1, dec!(0.50));
    let session = active_session(&engine, program);

    let result = engine.place_order(
        session,
        OrderRequest::cash(
            vec![
                OrderLineInput::new(WATER, 3),
                OrderLineInput::new(CANDY, 2), // only 1 on hand
            ],
            dec!(20.00),
        ),
    );

    assert_eq!(result, Err(LedgerError::InsufficientStock(CANDY)));
    // Water's deduction was rolled back exactly.
    assert_eq!(engine.on_hand(WATER), 10);
    assert_eq!(engine.on_hand(CANDY), 1);
    assert_eq!(engine.session_snapshot(session).unwrap().order_count, 0);
}

#[test]
fn composite_sale_consumes_components() {
    let (engine, program) = setup();
    stock(&engine, CHIPS, 10, dec!(0.30));
    stock(&engine, CHEESE, 10, dec!(0.20));
    let session = active_session(&engine, program);

    let receipt = engine
        .place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::new(NACHOS, 2)], dec!(10.00)),
        )
        .unwrap();

    assert_eq!(receipt.subtotal, dec!(8.00));
    assert_eq!(engine.on_hand(CHIPS), 8);
    assert_eq!(engine.on_hand(CHEESE), 6);
    // Composites hold no lots of their own.
    assert_eq!(engine.on_hand(NACHOS), 0);
}

#[test]
fn composite_shortage_rolls_back_sibling_components() {
    let (engine, program) = setup();
    stock(&engine, CHIPS, 10, dec!(0.30));
    stock(&engine, CHEESE, 1, dec!(0.20)); // needs 2 per nachos
    let session = active_session(&engine, program);

    let result = engine.place_order(
        session,
        OrderRequest::cash(vec![OrderLineInput::new(NACHOS, 1)], dec!(5.00)),
    );

    assert_eq!(result, Err(LedgerError::InsufficientStock(CHEESE)));
    assert_eq!(engine.on_hand(CHIPS), 10);
    assert_eq!(engine.on_hand(CHEESE), 1);
}

#[test]
fn unknown_and_unpriced_items_rejected() {
    let (engine, program) = setup();
    let session = active_session(&engine, program);

    assert_eq!(
        engine.place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::new(ItemId(99), 1)], dec!(5.00)),
        ),
        Err(LedgerError::UnknownItem(ItemId(99)))
    );

    // Supplies have no price; an explicit override makes them sellable.
    stock(&engine, CHIPS, 5, dec!(0.30));
    assert_eq!(
        engine.place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::new(CHIPS, 1)], dec!(5.00)),
        ),
        Err(LedgerError::UnpricedItem(CHIPS))
    );
    let receipt = engine
        .place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::priced(CHIPS, 1, dec!(0.75))], dec!(5.00)),
        )
        .unwrap();
    assert_eq!(receipt.subtotal, dec!(0.75));
}

#[test]
fn cashapp_payment_credits_ledger_and_journal() {
    let (engine, program) = setup();
    stock(&engine, CANDY, 10, dec!(0.50));
    let session = active_session(&engine, program);

    let request = OrderRequest {
        lines: vec![OrderLineInput::new(CANDY, 2)],
        payment: PaymentMethod::CashApp,
        ..OrderRequest::default()
    };
    engine.place_order(session, request).unwrap();

    assert_eq!(engine.cashapp_balance(), dec!(3.00));
    assert_eq!(engine.journal_snapshot().len(), 1);

    assert_eq!(engine.cashapp_withdraw(dec!(1.00)), Ok(dec!(2.00)));
    assert_eq!(
        engine.cashapp_withdraw(dec!(10.00)),
        Err(LedgerError::InsufficientFunds)
    );
}

#[test]
fn zelle_payment_journals_without_cashapp_credit() {
    let (engine, program) = setup();
    stock(&engine, CANDY, 10, dec!(0.50));
    let session = active_session(&engine, program);

    let request = OrderRequest {
        lines: vec![OrderLineInput::new(CANDY, 1)],
        payment: PaymentMethod::Zelle,
        ..OrderRequest::default()
    };
    engine.place_order(session, request).unwrap();

    assert_eq!(engine.cashapp_balance(), Decimal::ZERO);
    assert_eq!(engine.journal_snapshot().len(), 1);
}

// === Concurrency ===

#[test]
fn concurrent_orders_cannot_both_win_the_last_unit() {
    let (engine, program) = setup();
    stock(&engine, CANDY, 1, dec!(0.50));
    let session = active_session(&engine, program);
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            engine.place_order(
                session,
                OrderRequest::cash(vec![OrderLineInput::new(CANDY, 1)], dec!(2.00)),
            )
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let stockouts = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::InsufficientStock(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(stockouts, 1);
    assert_eq!(engine.on_hand(CANDY), 0);
}

// === Practice sessions ===

#[test]
fn practice_session_never_touches_real_ledgers() {
    let (engine, program) = setup();
    stock(&engine, WATER, 10, dec!(0.25));
    let session = engine.create_session("training", program, true).unwrap();
    engine.start_session(session, drawer(0, 0, 0, 0, 1)).unwrap();

    let request = OrderRequest {
        lines: vec![OrderLineInput::new(WATER, 3)],
        payment: PaymentMethod::CashApp,
        discount_amount: dec!(1.00),
        charged_to: ChargeTarget::Program(program),
        ..OrderRequest::default()
    };
    let receipt = engine.place_order(session, request).unwrap();
    assert_eq!(receipt.final_total, dec!(2.00));

    // Same data paths, zero real effect.
    assert_eq!(engine.on_hand(WATER), 10);
    assert_eq!(engine.cashapp_balance(), Decimal::ZERO);
    assert_eq!(engine.program_balance(program), Ok(Decimal::ZERO));
    assert_eq!(engine.reimbursement_totals().total(), Decimal::ZERO);
    assert!(engine.journal_snapshot().is_empty());

    // Ending practice deletes its orders; nothing to reverse.
    let closeout = engine.close_session(session, drawer(0, 0, 0, 0, 1)).unwrap();
    assert_eq!(closeout.profit, Decimal::ZERO);
    assert_eq!(engine.session_snapshot(session).unwrap().order_count, 0);
    assert_eq!(engine.on_hand(WATER), 10);
}

#[test]
fn practice_orders_are_still_validated() {
    let (engine, program) = setup();
    let session = engine.create_session("training", program, true).unwrap();
    engine.start_session(session, DrawerCount::default()).unwrap();

    // Validation runs even though nothing would be consumed.
    assert_eq!(
        engine.place_order(session, OrderRequest::default()),
        Err(LedgerError::EmptyOrder)
    );
    let result = engine.place_order(
        session,
        OrderRequest::cash(vec![OrderLineInput::new(WATER, 1)], Decimal::ZERO),
    );
    assert_eq!(result, Err(LedgerError::InsufficientTender));
}

// === Purchases ===

#[test]
fn purchase_overhead_is_distributed_proportionally() {
    let (engine, _) = setup();

    // $100 of goods, $10 overhead; the $25 line gets $2.50.
    let receipt = engine
        .create_purchase(PurchaseInput {
            vendor: "Costco".into(),
            date: date(2026, 3, 1),
            lines: vec![
                PurchaseLine::linked(WATER, "Water flat", 25, dec!(25.00)),
                PurchaseLine::linked(CANDY, "Candy box", 75, dec!(75.00)),
            ],
            tax: dec!(8.00),
            delivery_fee: dec!(2.00),
            other_fees: Decimal::ZERO,
            notes: None,
        })
        .unwrap();

    assert_eq!(receipt.lot_ids.len(), 2);
    assert_eq!(receipt.unlinked_lines, 0);
    // (25 + 2.50) / 25 = 1.10 per water
    assert_eq!(engine.stock_snapshot(WATER).lots[0].unit_cost, dec!(1.10));
    // (75 + 7.50) / 75 = 1.10 per candy
    assert_eq!(engine.stock_snapshot(CANDY).lots[0].unit_cost, dec!(1.10));
    assert_eq!(engine.on_hand(WATER), 25);
}

#[test]
fn unlinked_lines_are_counted_but_stock_free() {
    let (engine, _) = setup();

    let receipt = engine
        .create_purchase(PurchaseInput {
            vendor: "Smart & Final".into(),
            date: date(2026, 3, 1),
            lines: vec![
                PurchaseLine::linked(WATER, "Water", 10, dec!(5.00)),
                PurchaseLine::unlinked("Folding table", 1, dec!(30.00)),
            ],
            tax: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            other_fees: Decimal::ZERO,
            notes: Some("table is for the booth".into()),
        })
        .unwrap();

    assert_eq!(receipt.lot_ids.len(), 1);
    assert_eq!(receipt.unlinked_lines, 1);
}

#[test]
fn purchase_lots_are_reimbursable_and_manual_stock_is_not() {
    let (engine, program) = setup();

    engine
        .create_purchase(PurchaseInput {
            vendor: "Costco".into(),
            date: date(2026, 3, 1),
            lines: vec![PurchaseLine::linked(WATER, "Water", 10, dec!(2.50))],
            tax: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            other_fees: Decimal::ZERO,
            notes: None,
        })
        .unwrap();
    engine
        .record_stock_update(WATER, 10, dec!(0.25), date(2026, 3, 2))
        .unwrap();

    let session = active_session(&engine, program);
    // Drain the purchase lot (10) plus 5 manual units.
    engine
        .place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::new(WATER, 15)], dec!(20.00)),
        )
        .unwrap();

    let totals = engine.reimbursement_totals();
    assert_eq!(totals.reimbursable, dec!(2.50));
    assert_eq!(totals.non_reimbursable, dec!(1.25));
}

#[test]
fn delete_purchase_reverses_intact_lots() {
    let (engine, _) = setup();

    let receipt = engine
        .create_purchase(PurchaseInput {
            vendor: "Costco".into(),
            date: date(2026, 3, 1),
            lines: vec![PurchaseLine::linked(WATER, "Water", 10, dec!(2.50))],
            tax: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            other_fees: Decimal::ZERO,
            notes: None,
        })
        .unwrap();

    let reversed = engine.delete_purchase(receipt.purchase_id).unwrap();
    assert_eq!(reversed, receipt.lot_ids);
    assert_eq!(engine.on_hand(WATER), 0);

    // Gone means gone.
    assert_eq!(
        engine.delete_purchase(receipt.purchase_id),
        Err(LedgerError::UnknownPurchase(receipt.purchase_id))
    );
}

#[test]
fn delete_purchase_with_consumed_lot_fails_untouched() {
    let (engine, program) = setup();

    let receipt = engine
        .create_purchase(PurchaseInput {
            vendor: "Costco".into(),
            date: date(2026, 3, 1),
            lines: vec![PurchaseLine::linked(WATER, "Water", 10, dec!(2.50))],
            tax: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            other_fees: Decimal::ZERO,
            notes: None,
        })
        .unwrap();

    let session = active_session(&engine, program);
    engine
        .place_order(
            session,
            OrderRequest::cash(vec![OrderLineInput::new(WATER, 1)], dec!(1.00)),
        )
        .unwrap();

    let result = engine.delete_purchase(receipt.purchase_id);
    assert_eq!(
        result,
        Err(LedgerError::CannotReverseConsumedLot(receipt.lot_ids[0]))
    );
    // Lot untouched, purchase still deletable later if stock returns.
    assert_eq!(engine.on_hand(WATER), 9);
    let lot = &engine.stock_snapshot(WATER).lots[0];
    assert_eq!(lot.quantity_original, 10);
    assert_eq!(lot.quantity_remaining, 9);
}

// === Adjustments ===

#[test]
fn writeoff_adjustment_reports_valued_loss() {
    let (engine, _) = setup();
    stock(&engine, CANDY, 10, dec!(0.50));

    let adjustment = engine
        .adjust_inventory(CANDY, Adjustment::Wasted(3))
        .unwrap();
    assert_eq!(adjustment.on_hand, 7);
    assert_eq!(adjustment.write_off.non_reimbursable, dec!(1.50));

    // The caller records the matching loss.
    engine
        .record_loss(
            None,
            None,
            LossKind::Spoilage,
            adjustment.write_off.total(),
            "melted in the sun",
        )
        .unwrap();
    assert_eq!(engine.loss_total(LossKind::Spoilage), dec!(1.50));
}

#[test]
fn writeoff_beyond_stock_fails() {
    let (engine, _) = setup();
    stock(&engine, CANDY, 2, dec!(0.50));
    assert_eq!(
        engine.adjust_inventory(CANDY, Adjustment::Lost(3)),
        Err(LedgerError::InsufficientStock(CANDY))
    );
    assert_eq!(engine.on_hand(CANDY), 2);
}

#[test]
fn recount_clamps_and_never_fails() {
    let (engine, _) = setup();
    stock(&engine, CANDY, 4, dec!(0.50));

    let up = engine.adjust_inventory(CANDY, Adjustment::Count(3)).unwrap();
    assert_eq!(up.on_hand, 7);
    assert_eq!(up.write_off.total(), Decimal::ZERO);

    let down = engine
        .adjust_inventory(CANDY, Adjustment::Count(-100))
        .unwrap();
    assert_eq!(down.on_hand, 0);
}

#[test]
fn untracked_items_bypass_adjustment() {
    let (engine, _) = setup();
    // Nachos is composite, never tracked.
    let result = engine
        .adjust_inventory(NACHOS, Adjustment::Wasted(5))
        .unwrap();
    assert_eq!(result.on_hand, 0);
    assert_eq!(result.write_off.total(), Decimal::ZERO);

    // Manual stock on untracked items creates no lot.
    assert_eq!(
        engine.record_stock_update(NACHOS, 5, dec!(0.10), date(2026, 3, 1)),
        Ok(None)
    );
}

// === Profit distribution ===

#[test]
fn distribute_profit_reports_remaining() {
    let (engine, program) = setup();
    let band = engine.register_program("Band");
    let session = active_session(&engine, program);
    engine
        .close_session(session, drawer(21, 18, 4, 1, 1))
        .unwrap(); // profit 23.25

    let remaining = engine
        .distribute_profit(
            session,
            &[
                Allocation {
                    program_id: program,
                    amount: dec!(10.00),
                },
                Allocation {
                    program_id: band,
                    amount: dec!(5.00),
                },
            ],
        )
        .unwrap();

    assert_eq!(remaining, dec!(8.25));
    assert_eq!(engine.program_balance(program), Ok(dec!(10.00)));
    assert_eq!(engine.program_balance(band), Ok(dec!(5.00)));
    assert_eq!(engine.distributions_for(session).len(), 2);

    // Re-invocable; over-distribution goes negative, advisory only.
    let remaining = engine
        .distribute_profit(
            session,
            &[Allocation {
                program_id: band,
                amount: dec!(10.00),
            }],
        )
        .unwrap();
    assert_eq!(remaining, dec!(-1.75));
}

#[test]
fn distribution_requires_closed_session() {
    let (engine, program) = setup();
    let session = active_session(&engine, program);

    let result = engine.distribute_profit(
        session,
        &[Allocation {
            program_id: program,
            amount: dec!(1.00),
        }],
    );
    assert_eq!(result, Err(LedgerError::WrongSessionState));
}

#[test]
fn bad_allocation_applies_nothing() {
    let (engine, program) = setup();
    let session = active_session(&engine, program);
    engine.close_session(session, drawer(0, 0, 0, 0, 3)).unwrap();

    let result = engine.distribute_profit(
        session,
        &[
            Allocation {
                program_id: program,
                amount: dec!(5.00),
            },
            Allocation {
                program_id: ProgramId(404),
                amount: dec!(5.00),
            },
        ],
    );
    assert_eq!(result, Err(LedgerError::UnknownProgram(ProgramId(404))));
    // First allocation was not applied either.
    assert_eq!(engine.program_balance(program), Ok(Decimal::ZERO));
    assert!(engine.distributions_for(session).is_empty());
}

// === Program accounts & losses ===

#[test]
fn program_deposits_withdrawals_and_journal() {
    let (engine, program) = setup();

    assert_eq!(engine.program_deposit(program, dec!(100.00)), Ok(dec!(100.00)));
    assert_eq!(engine.program_withdraw(program, dec!(30.00)), Ok(dec!(70.00)));
    assert_eq!(
        engine.program_withdraw(program, dec!(100.00)),
        Err(LedgerError::InsufficientFunds)
    );

    let journal = engine.journal_snapshot();
    assert_eq!(journal.len(), 2);
    assert_eq!(journal[0].amount, dec!(100.00));
    assert_eq!(journal[1].amount, dec!(-30.00));
}

#[test]
fn losses_are_recorded_with_kind_totals() {
    let (engine, program) = setup();
    let session = active_session(&engine, program);
    engine.close_session(session, drawer(0, 0, 0, 0, 2)).unwrap();

    engine
        .record_loss(
            Some(session),
            Some(program),
            LossKind::CashDiscrepancy,
            dec!(3.75),
            "drawer short at close",
        )
        .unwrap();

    assert_eq!(engine.loss_total(LossKind::CashDiscrepancy), dec!(3.75));
    let losses = engine.losses();
    assert_eq!(losses.len(), 1);
    assert_eq!(losses[0].session_id, Some(session));

    assert_eq!(
        engine.record_loss(None, None, LossKind::Other, Decimal::ZERO, ""),
        Err(LedgerError::InvalidAmount)
    );
}
