// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::chart::{
    ChartGroup, GroupBy, group_by_payee, group_transactions_by_category, rows_for_group,
};
use crate::commands::transactions::{filter_from_matches, transaction_table};
use crate::models::{Transaction, TransactionType};
use crate::store::{TransactionFilter, fetch_categories, query_transactions};
use crate::utils::{fmt_money, json_flags, maybe_print_json, pretty_table, req_arg};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("category", sub)) => chart(conn, sub, GroupBy::Category)?,
        Some(("payee", sub)) => chart(conn, sub, GroupBy::Payee)?,
        Some(("rows", sub)) => rows(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Charts show spending unless `--type` asks for something else.
fn chart_filter(sub: &clap::ArgMatches) -> Result<TransactionFilter> {
    let mut filter = filter_from_matches(sub)?;
    if filter.transaction_type.is_none() {
        filter.transaction_type = Some(TransactionType::Expense);
    }
    filter.limit = None;
    Ok(filter)
}

pub fn chart_groups(
    conn: &Connection,
    filter: &TransactionFilter,
    group_by: GroupBy,
) -> Result<Vec<ChartGroup>> {
    let transactions: Vec<Transaction> = query_transactions(conn, filter)?
        .into_iter()
        .map(|r| r.transaction)
        .collect();
    let groups = match group_by {
        GroupBy::Category => {
            let categories = fetch_categories(conn)?;
            group_transactions_by_category(&transactions, &categories)
        }
        GroupBy::Payee => group_by_payee(&transactions),
    };
    Ok(groups)
}

/// 20 cells at 100% of the largest group.
fn bar(pct_of_max: Decimal) -> String {
    let width = (pct_of_max / Decimal::from(5)).round().to_usize().unwrap_or(0);
    "█".repeat(width)
}

fn chart(conn: &Connection, sub: &clap::ArgMatches, group_by: GroupBy) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let filter = chart_filter(sub)?;
    let groups = chart_groups(conn, &filter, group_by)?;
    if maybe_print_json(json_flag, jsonl_flag, &groups)? {
        return Ok(());
    }
    let mut data = Vec::new();
    for g in &groups {
        data.push(vec![
            g.label.clone(),
            fmt_money(&g.total),
            format!("{:.1}%", g.pct_of_total),
            bar(g.pct_of_max),
        ]);
        for c in &g.children {
            data.push(vec![
                format!("  └ {}", c.label),
                fmt_money(&c.total),
                String::new(),
                String::new(),
            ]);
        }
    }
    let first = match group_by {
        GroupBy::Category => "Category",
        GroupBy::Payee => "Payee",
    };
    println!("{}", pretty_table(&[first, "Total", "Share", ""], data));
    Ok(())
}

fn rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let group_by: GroupBy = req_arg(sub, "group_by")?.parse()?;
    let key = req_arg(sub, "key")?;
    let filter = chart_filter(sub)?;
    let data = rows_for_group(query_transactions(conn, &filter)?, group_by, &key);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", transaction_table(&data));
    }
    Ok(())
}
