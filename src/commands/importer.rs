// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::csv_import::{ParsedTransaction, parse_transactions};
use crate::error::FinanceError;
use crate::rules::apply_rules;
use crate::store::{self, NewTransaction};
use crate::utils::{fmt_money, id_for_account, pretty_table, req_arg};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("csv", sub)) => import_csv_file(conn, sub),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub categorised: usize,
}

/// Parses `raw` and inserts every row against `account_id` in one store
/// transaction, auto-categorising through the active rules.
pub fn import_csv(conn: &mut Connection, raw: &str, account_id: i64) -> Result<ImportReport> {
    let parsed = parse_transactions(raw);
    if parsed.is_empty() {
        return Err(FinanceError::NoTransactionsParsed.into());
    }

    let tx = conn.transaction()?;
    let rules = store::fetch_rules(&tx, true)?;
    let mut report = ImportReport {
        imported: 0,
        categorised: 0,
    };
    for p in &parsed {
        let mut new_tx = NewTransaction {
            account_id,
            category_id: None,
            date: p.date,
            description: p.description.clone(),
            amount: p.magnitude(),
            transaction_type: p.transaction_type(),
            payee: None,
            reference: None,
            notes: None,
        };
        new_tx.category_id = apply_rules(&rules, &new_tx.as_transaction());
        if new_tx.category_id.is_some() {
            report.categorised += 1;
        }
        store::insert_transaction(&tx, &new_tx)?;
        report.imported += 1;
    }
    tx.commit()?;
    tracing::info!(
        imported = report.imported,
        categorised = report.categorised,
        "csv import committed"
    );
    Ok(report)
}

fn preview(parsed: &[ParsedTransaction]) -> comfy_table::Table {
    let rows = parsed
        .iter()
        .map(|p| {
            vec![
                p.date.to_string(),
                p.description.clone(),
                fmt_money(&p.amount),
                p.transaction_type().to_string(),
            ]
        })
        .collect();
    pretty_table(&["Date", "Description", "Amount", "Type"], rows)
}

fn import_csv_file(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = req_arg(sub, "path")?;
    let bytes = std::fs::read(&path).with_context(|| format!("Open CSV {}", path))?;
    // bank exports are often Latin-1; undecodable bytes become U+FFFD
    let raw = String::from_utf8_lossy(&bytes);

    if sub.get_flag("dry_run") {
        let parsed = parse_transactions(&raw);
        if parsed.is_empty() {
            return Err(FinanceError::NoTransactionsParsed.into());
        }
        println!("{}", preview(&parsed));
        println!("{} transaction(s) parsed (dry run, nothing saved)", parsed.len());
        return Ok(());
    }

    let account = req_arg(sub, "account")?;
    let account_id = id_for_account(conn, &account)?;
    let report = import_csv(conn, &raw, account_id)?;
    println!(
        "Imported {} transaction(s) from {} into '{}' ({} auto-categorised)",
        report.imported, path, account, report.categorised
    );
    Ok(())
}
