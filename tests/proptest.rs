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

//! Property-based tests for the inventory and money invariants.
//!
//! These verify invariants that should hold for any sequence of valid
//! operations.

use chrono::NaiveDate;
use concession_ledger_rs::{
    Adjustment, DrawerCount, InventoryLedger, ItemId, PurchaseLine, ReimbursementTracker,
    allocate_line_costs,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// A positive unit cost between $0.0001 and $10.
fn arb_unit_cost() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// A lot receipt: (quantity, unit cost, day offset, reimbursable).
fn arb_receipt() -> impl Strategy<Value = (u32, Decimal, u32, bool)> {
    (1u32..=50, arb_unit_cost(), 0u32..=60, any::<bool>())
}

/// One inventory operation to replay.
#[derive(Debug, Clone)]
enum Op {
    Receive { qty: u32, unit_cost: Decimal, day: u32, reimbursable: bool },
    Consume { qty: u32 },
    Waste { qty: u32 },
    Recount { delta: i64 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_receipt().prop_map(|(qty, unit_cost, day, reimbursable)| Op::Receive {
            qty,
            unit_cost,
            day,
            reimbursable
        }),
        (1u32..=60).prop_map(|qty| Op::Consume { qty }),
        (1u32..=20).prop_map(|qty| Op::Waste { qty }),
        (-40i64..=40).prop_map(|delta| Op::Recount { delta }),
    ]
}

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(u64::from(offset))
}

// =============================================================================
// Inventory Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Quantity on hand always equals the sum of lot remainders, no matter
    /// what sequence of operations ran (including failed ones).
    #[test]
    fn on_hand_equals_lot_sum(ops in prop::collection::vec(arb_op(), 1..40)) {
        let ledger = InventoryLedger::new();
        let item = ItemId(1);

        for op in &ops {
            match *op {
                Op::Receive { qty, unit_cost, day: d, reimbursable } => {
                    let _ = ledger.receive(item, qty, unit_cost, reimbursable, day(d), None);
                }
                Op::Consume { qty } => {
                    let _ = ledger.consume(item, qty);
                }
                Op::Waste { qty } => {
                    let _ = ledger.adjust(item, Adjustment::Wasted(qty));
                }
                Op::Recount { delta } => {
                    let _ = ledger.adjust(item, Adjustment::Count(delta));
                }
            }
        }

        let snapshot = ledger.snapshot(item);
        let lot_sum: u64 = snapshot.lots.iter().map(|l| u64::from(l.quantity_remaining)).sum();
        prop_assert_eq!(snapshot.on_hand, lot_sum);
    }

    /// A consumption drains lots in (date, id) order: every lot with stock
    /// left sorts at or after every lot the consumption touched.
    #[test]
    fn consumption_is_oldest_first(
        receipts in prop::collection::vec(arb_receipt(), 1..10),
        take in 1u32..=100,
    ) {
        let ledger = InventoryLedger::new();
        let item = ItemId(1);
        for &(qty, unit_cost, d, reimbursable) in &receipts {
            ledger.receive(item, qty, unit_cost, reimbursable, day(d), None).unwrap();
        }

        if let Ok(taken) = ledger.consume(item, take) {
            let snapshot = ledger.snapshot(item);
            let order_of = |lot_id| snapshot
                .lots
                .iter()
                .position(|l| l.lot_id == lot_id)
                .expect("consumed lot must still exist");

            // The breakdown itself is in FIFO order...
            let positions: Vec<usize> = taken.iter().map(|c| order_of(c.lot_id)).collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

            // ...and no untouched older lot still has stock while a newer
            // lot was drained.
            if let Some(&last) = positions.last() {
                for (i, lot) in snapshot.lots.iter().enumerate() {
                    if i < last {
                        prop_assert!(
                            lot.quantity_remaining == 0 || positions.contains(&i),
                            "older lot {} skipped", lot.lot_id
                        );
                    }
                }
            }
        }
    }

    /// A failed consumption is invisible: every lot keeps its remainder.
    #[test]
    fn failed_consume_changes_nothing(
        receipts in prop::collection::vec(arb_receipt(), 1..6),
    ) {
        let ledger = InventoryLedger::new();
        let item = ItemId(1);
        let mut total = 0u64;
        for &(qty, unit_cost, d, reimbursable) in &receipts {
            ledger.receive(item, qty, unit_cost, reimbursable, day(d), None).unwrap();
            total += u64::from(qty);
        }

        let before = ledger.snapshot(item);
        let result = ledger.consume(item, (total + 1) as u32);
        prop_assert!(result.is_err());
        let after = ledger.snapshot(item);

        for (b, a) in before.lots.iter().zip(after.lots.iter()) {
            prop_assert_eq!(b.quantity_remaining, a.quantity_remaining);
        }
    }

    /// restore() is the exact inverse of consume().
    #[test]
    fn consume_restore_round_trips(
        receipts in prop::collection::vec(arb_receipt(), 1..8),
        take in 1u32..=80,
    ) {
        let ledger = InventoryLedger::new();
        let item = ItemId(1);
        for &(qty, unit_cost, d, reimbursable) in &receipts {
            ledger.receive(item, qty, unit_cost, reimbursable, day(d), None).unwrap();
        }

        let before = ledger.snapshot(item);
        if let Ok(taken) = ledger.consume(item, take) {
            ledger.restore(&taken);
            let after = ledger.snapshot(item);
            prop_assert_eq!(before.on_hand, after.on_hand);
            for (b, a) in before.lots.iter().zip(after.lots.iter()) {
                prop_assert_eq!(b.lot_id, a.lot_id);
                prop_assert_eq!(b.quantity_remaining, a.quantity_remaining);
            }
        }
    }

    /// Reimbursement totals equal the sum of consumed lot costs, split by
    /// the lot flag.
    #[test]
    fn reimbursement_split_matches_consumed_cost(
        receipts in prop::collection::vec(arb_receipt(), 1..8),
        take in 1u32..=80,
    ) {
        let ledger = InventoryLedger::new();
        let tracker = ReimbursementTracker::new();
        let item = ItemId(1);
        for &(qty, unit_cost, d, reimbursable) in &receipts {
            ledger.receive(item, qty, unit_cost, reimbursable, day(d), None).unwrap();
        }

        if let Ok(taken) = ledger.consume(item, take) {
            tracker.record(&taken);
            let expected_total: Decimal = taken.iter().map(|c| c.value()).sum();
            let expected_reimbursable: Decimal = taken
                .iter()
                .filter(|c| c.is_reimbursable)
                .map(|c| c.value())
                .sum();

            let totals = tracker.totals();
            prop_assert_eq!(totals.total(), expected_total);
            prop_assert_eq!(totals.reimbursable, expected_reimbursable);
        }
    }
}

// =============================================================================
// Purchase Overhead Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Overhead shares sum to the full overhead (within the sub-cent
    /// remainder division leaves behind).
    #[test]
    fn overhead_shares_sum_to_overhead(
        line_cents in prop::collection::vec(1i64..=50_000i64, 1..8),
        overhead_cents in 0i64..=10_000i64,
    ) {
        let lines: Vec<PurchaseLine> = line_cents
            .iter()
            .enumerate()
            .map(|(i, &cents)| PurchaseLine::linked(
                ItemId(i as u32 + 1),
                "line",
                1,
                Decimal::new(cents, 2),
            ))
            .collect();
        let overhead = Decimal::new(overhead_cents, 2);

        let costs = allocate_line_costs(&lines, overhead);
        let share_sum: Decimal = costs.iter().map(|c| c.overhead_share).sum();

        let tolerance = Decimal::new(1, 4); // 0.0001
        prop_assert!((share_sum - overhead).abs() <= tolerance,
            "shares {} vs overhead {}", share_sum, overhead);
    }

    /// Each line's unit cost reproduces its line share: unit_cost * qty
    /// equals line_total + overhead_share (when CRV is zero).
    #[test]
    fn unit_cost_reproduces_line_share(
        qty in 1u32..=100,
        line_cents in 1i64..=50_000i64,
        overhead_cents in 0i64..=10_000i64,
    ) {
        let lines = vec![PurchaseLine::linked(
            ItemId(1),
            "line",
            qty,
            Decimal::new(line_cents, 2),
        )];
        let overhead = Decimal::new(overhead_cents, 2);
        let costs = allocate_line_costs(&lines, overhead);

        let rebuilt = costs[0].unit_cost * Decimal::from(qty);
        let expected = lines[0].line_total + costs[0].overhead_share;
        let tolerance = Decimal::new(1, 4);
        prop_assert!((rebuilt - expected).abs() <= tolerance,
            "rebuilt {} vs expected {}", rebuilt, expected);
    }
}

// =============================================================================
// Drawer Arithmetic
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Drawer valuation is exact quarter-arithmetic: value is always a
    /// multiple of 0.25 and matches the per-denomination sum.
    #[test]
    fn drawer_value_matches_denomination_sum(
        quarters in 0u32..=200,
        ones in 0u32..=200,
        fives in 0u32..=100,
        tens in 0u32..=100,
        twenties in 0u32..=50,
        fifties in 0u32..=20,
        hundreds in 0u32..=10,
    ) {
        let drawer = DrawerCount { quarters, ones, fives, tens, twenties, fifties, hundreds };
        let expected = Decimal::new(25, 2) * Decimal::from(quarters)
            + Decimal::from(ones)
            + Decimal::from(5u32 * fives)
            + Decimal::from(10u32 * tens)
            + Decimal::from(20u32 * twenties)
            + Decimal::from(50u32 * fifties)
            + Decimal::from(100u32 * hundreds);

        prop_assert_eq!(drawer.value(), expected);
        // Quarter-exact: scaling by 4 yields a whole number.
        prop_assert!((drawer.value() * Decimal::from(4u32)).fract().is_zero());
    }
}
