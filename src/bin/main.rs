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

use chrono::NaiveDate;
use clap::Parser;
use concession_ledger_rs::{
    Adjustment, InventoryLedger, ItemId, ReimbursementTracker,
};
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Stock Replay - Rebuild inventory valuation from an operations CSV
///
/// Reads stock operations from a CSV file and outputs per-item valuation
/// to stdout. Supports receives, sales, spoilage write-offs, and recounts.
#[derive(Parser, Debug)]
#[command(name = "concession-ledger-rs")]
#[command(about = "Replays a stock operations CSV into a FIFO valuation", long_about = None)]
struct Args {
    /// Path to CSV file with stock operations
    ///
    /// Expected format: op,item,qty,unit_cost,date,reimbursable
    /// Example: cargo run -- operations.csv > valuation.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let (ledger, tracker) = match replay_operations(BufReader::new(file)) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error replaying operations: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_valuation(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }

    let totals = tracker.totals();
    eprintln!(
        "consumed cost: reimbursable {}, non-reimbursable {}",
        totals.reimbursable, totals.non_reimbursable
    );
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, item, qty, unit_cost, date, reimbursable`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    item: u32,
    #[serde(deserialize_with = "csv::invalid_option")]
    qty: Option<i64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    unit_cost: Option<Decimal>,
    #[serde(deserialize_with = "csv::invalid_option")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    reimbursable: Option<bool>,
}

/// One replayable stock operation.
#[derive(Debug)]
enum StockOp {
    Receive {
        item: ItemId,
        qty: u32,
        unit_cost: Decimal,
        date: NaiveDate,
        reimbursable: bool,
    },
    Sale {
        item: ItemId,
        qty: u32,
    },
    Spoilage {
        item: ItemId,
        qty: u32,
    },
    Recount {
        item: ItemId,
        delta: i64,
    },
}

impl CsvRecord {
    /// Converts a CSV record into a stock operation.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_op(self) -> Option<StockOp> {
        let item = ItemId(self.item);

        match self.op.to_lowercase().as_str() {
            "receive" => {
                let qty = u32::try_from(self.qty?).ok().filter(|&q| q > 0)?;
                Some(StockOp::Receive {
                    item,
                    qty,
                    unit_cost: self.unit_cost.unwrap_or(Decimal::ZERO),
                    date: self.date.unwrap_or_default(),
                    reimbursable: self.reimbursable.unwrap_or(true),
                })
            }
            "sale" => {
                let qty = u32::try_from(self.qty?).ok().filter(|&q| q > 0)?;
                Some(StockOp::Sale { item, qty })
            }
            "spoilage" => {
                let qty = u32::try_from(self.qty?).ok().filter(|&q| q > 0)?;
                Some(StockOp::Spoilage { item, qty })
            }
            "recount" => Some(StockOp::Recount {
                item,
                delta: self.qty?,
            }),
            _ => None,
        }
    }
}

/// Replays stock operations from a CSV reader.
///
/// Streaming: arbitrarily large files are handled row by row. Malformed
/// rows and operations that fail (e.g. a sale beyond stock) are skipped;
/// failures are logged in debug builds only.
///
/// # CSV Format
///
/// Expected columns: `op, item, qty, unit_cost, date, reimbursable`
/// - `op`: receive, sale, spoilage, or recount
/// - `item`: item id (u32)
/// - `qty`: quantity (signed; only recount may be negative)
/// - `unit_cost`: decimal cost per unit (receive only)
/// - `date`: ISO date (receive only)
/// - `reimbursable`: true/false (receive only, defaults true)
///
/// # Example
///
/// ```csv
/// op,item,qty,unit_cost,date,reimbursable
/// receive,1,24,0.55,2026-03-01,true
/// sale,1,2,,,
/// recount,1,-1,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is
/// invalid. Individual operation failures don't stop the replay.
pub fn replay_operations<R: Read>(
    reader: R,
) -> Result<(InventoryLedger, ReimbursementTracker), csv::Error> {
    let ledger = InventoryLedger::new();
    let tracker = ReimbursementTracker::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_op() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                    continue;
                };
                apply(&ledger, &tracker, op);
            }
            Err(_e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", _e);
                continue;
            }
        }
    }

    Ok((ledger, tracker))
}

fn apply(ledger: &InventoryLedger, tracker: &ReimbursementTracker, op: StockOp) {
    let result = match op {
        StockOp::Receive {
            item,
            qty,
            unit_cost,
            date,
            reimbursable,
        } => ledger
            .receive(item, qty, unit_cost, reimbursable, date, None)
            .map(|_| ()),
        StockOp::Sale { item, qty } => ledger.consume(item, qty).map(|consumed| {
            tracker.record(&consumed);
        }),
        StockOp::Spoilage { item, qty } => {
            ledger.adjust(item, Adjustment::Wasted(qty)).map(|(_, consumed)| {
                tracker.record(&consumed);
            })
        }
        StockOp::Recount { item, delta } => {
            ledger.adjust(item, Adjustment::Count(delta)).map(|_| ())
        }
    };

    if let Err(_e) = result {
        #[cfg(debug_assertions)]
        eprintln!("Skipping failed operation: {}", _e);
    }
}

/// Per-item valuation output row.
///
/// Columns: `item, on_hand, lots, value`
#[derive(Debug, Serialize)]
struct ValuationRow {
    item: u32,
    on_hand: u64,
    lots: usize,
    value: Decimal,
}

/// Writes per-item valuation rows for every item the ledger has seen.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_valuation<W: Write>(ledger: &InventoryLedger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for item in ledger.items() {
        let snapshot = ledger.snapshot(item);
        wtr.serialize(ValuationRow {
            item: item.0,
            on_hand: snapshot.on_hand,
            lots: snapshot.lots.len(),
            value: snapshot.value,
        })?;
    }

    wtr.flush()?;
    Ok(())
}
