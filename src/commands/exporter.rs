// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{SortKey, TransactionFilter, query_transactions};
use crate::utils::req_arg;
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = req_arg(sub, "format")?.to_lowercase();
    let out = req_arg(sub, "out")?;

    let filter = TransactionFilter {
        sort: SortKey::Date,
        ..TransactionFilter::default()
    };
    let rows = query_transactions(conn, &filter)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr =
                csv::Writer::from_path(&out).with_context(|| format!("Create {}", out))?;
            wtr.write_record([
                "date",
                "account",
                "description",
                "amount",
                "type",
                "payee",
                "reference",
                "category",
                "notes",
            ])?;
            for r in &rows {
                let t = &r.transaction;
                wtr.write_record([
                    t.date.to_string(),
                    r.account.clone(),
                    t.description.clone(),
                    t.amount.to_string(),
                    t.transaction_type.to_string(),
                    t.payee.clone().unwrap_or_default(),
                    t.reference.clone().unwrap_or_default(),
                    r.category.clone().unwrap_or_default(),
                    t.notes.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .iter()
                .map(|r| {
                    let t = &r.transaction;
                    json!({
                        "date": t.date, "account": r.account, "description": t.description,
                        "amount": t.amount.to_string(), "type": t.transaction_type,
                        "payee": t.payee, "reference": t.reference, "category": r.category,
                        "notes": t.notes
                    })
                })
                .collect();
            std::fs::write(&out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out))?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    tracing::info!(rows = rows.len(), %out, "exported transactions");
    println!("Exported {} transaction(s) to {}", rows.len(), out);
    Ok(())
}
