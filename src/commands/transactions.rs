// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::FinanceError;
use crate::models::TransactionType;
use crate::rules::apply_rules;
use crate::store::{
    self, BulkField, NewTransaction, SortKey, TransactionFilter, TransactionRow, bulk_delete, bulk_update,
};
use crate::utils::{
    fmt_money, id_for_account, id_for_category, json_flags, maybe_print_json, opt_arg,
    parse_amount, parse_date, parse_ids, pretty_table, req_arg,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("bulk-category", sub)) => {
            let ids = parse_ids(&req_arg(sub, "ids")?)?;
            let category_id = match opt_arg(sub, "category") {
                Some(c) => Some(id_for_category(conn, &c)?),
                None if sub.get_flag("clear") => None,
                None => return Err(anyhow!("Pass --category NAME or --clear")),
            };
            let n = bulk_update(conn, &ids, BulkField::Category, &category_id)?;
            println!("Updated category on {} transaction(s)", n);
        }
        Some(("bulk-payee", sub)) => {
            let ids = parse_ids(&req_arg(sub, "ids")?)?;
            let payee = req_arg(sub, "payee")?;
            let n = bulk_update(conn, &ids, BulkField::Payee, &payee)?;
            println!("Updated payee on {} transaction(s)", n);
        }
        Some(("bulk-description", sub)) => {
            let ids = parse_ids(&req_arg(sub, "ids")?)?;
            let description = req_arg(sub, "description")?;
            let n = bulk_update(conn, &ids, BulkField::Description, &description)?;
            println!("Updated description on {} transaction(s)", n);
        }
        Some(("bulk-delete", sub)) => {
            let ids = parse_ids(&req_arg(sub, "ids")?)?;
            let n = bulk_delete(conn, &ids)?;
            println!("Deleted {} transaction(s)", n);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(&req_arg(sub, "date")?)?;
    let account_name = req_arg(sub, "account")?;
    let amount = parse_amount(&req_arg(sub, "amount")?)?;
    let description = req_arg(sub, "description")?;
    let transaction_type: TransactionType = req_arg(sub, "type")?.parse()?;

    let account_id = id_for_account(conn, &account_name)?;
    let category_id = match opt_arg(sub, "category") {
        Some(cat) => Some(id_for_category(conn, &cat)?),
        None => None,
    };

    let mut new_tx = NewTransaction {
        account_id,
        category_id,
        date,
        description,
        amount,
        transaction_type,
        payee: opt_arg(sub, "payee"),
        reference: opt_arg(sub, "reference"),
        notes: opt_arg(sub, "notes"),
    };
    if new_tx.category_id.is_none() {
        let rules = store::fetch_rules(conn, true)?;
        new_tx.category_id = apply_rules(&rules, &new_tx.as_transaction());
    }

    let id = store::insert_transaction(conn, &new_tx)?;
    tracing::info!(id, "transaction recorded");
    println!(
        "Recorded #{} {} {} on {} '{}' (acct: {})",
        id,
        new_tx.transaction_type,
        fmt_money(&new_tx.amount),
        new_tx.date,
        new_tx.description,
        account_name
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("Missing --id")?;
    let mut t = store::fetch_transaction(conn, id)?
        .ok_or_else(|| FinanceError::NotFound(format!("Transaction {}", id)))?;

    if let Some(d) = opt_arg(sub, "date") {
        t.date = parse_date(&d)?;
    }
    if let Some(a) = opt_arg(sub, "amount") {
        t.amount = parse_amount(&a)?;
    }
    if let Some(d) = opt_arg(sub, "description") {
        t.description = d;
    }
    if let Some(tt) = opt_arg(sub, "type") {
        t.transaction_type = tt.parse()?;
    }
    if let Some(p) = opt_arg(sub, "payee") {
        t.payee = Some(p);
    }
    if let Some(r) = opt_arg(sub, "reference") {
        t.reference = Some(r);
    }
    if let Some(n) = opt_arg(sub, "notes") {
        t.notes = Some(n);
    }
    if let Some(c) = opt_arg(sub, "category") {
        t.category_id = Some(id_for_category(conn, &c)?);
    }
    if sub.get_flag("clear_payee") {
        t.payee = None;
    }
    if sub.get_flag("clear_reference") {
        t.reference = None;
    }
    if sub.get_flag("clear_notes") {
        t.notes = None;
    }
    if sub.get_flag("clear_category") {
        t.category_id = None;
    }

    conn.execute(
        "UPDATE transactions SET date=?1, amount=?2, description=?3, transaction_type=?4,
         payee=?5, reference=?6, notes=?7, category_id=?8 WHERE id=?9",
        params![
            t.date,
            t.amount.to_string(),
            t.description,
            t.transaction_type.as_str(),
            t.payee,
            t.reference,
            t.notes,
            t.category_id,
            id
        ],
    )?;
    tracing::info!(id, "transaction updated");
    println!("Updated transaction #{}", id);
    Ok(())
}

/// Builds the shared filter set from `tx list` / `chart` arguments.
pub fn filter_from_matches(sub: &clap::ArgMatches) -> Result<TransactionFilter> {
    let from = opt_arg(sub, "from").map(|s| parse_date(&s)).transpose()?;
    let to = opt_arg(sub, "to").map(|s| parse_date(&s)).transpose()?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(anyhow!("--from {} is after --to {}", f, t));
        }
    }
    Ok(TransactionFilter {
        account: opt_arg(sub, "account"),
        category: opt_arg(sub, "category"),
        search: opt_arg(sub, "search"),
        from,
        to,
        transaction_type: opt_arg(sub, "type")
            .map(|s| s.parse::<TransactionType>())
            .transpose()?,
        sort: opt_arg(sub, "sort")
            .map(|s| s.parse::<SortKey>())
            .transpose()?
            .unwrap_or_default(),
        descending: sub
            .try_get_one::<bool>("desc")
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false),
        limit: sub.try_get_one::<usize>("limit").ok().flatten().copied(),
    })
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let filter = filter_from_matches(sub)?;
    Ok(store::query_transactions(conn, &filter)?)
}

pub fn transaction_table(rows: &[TransactionRow]) -> comfy_table::Table {
    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let t = &r.transaction;
            vec![
                t.id.to_string(),
                t.date.to_string(),
                r.account.clone(),
                t.description.clone(),
                t.payee.clone().unwrap_or_default(),
                match t.transaction_type {
                    TransactionType::Transfer => fmt_money(&t.amount),
                    _ => fmt_money(&t.signed_amount()),
                },
                t.transaction_type.to_string(),
                r.category.clone().unwrap_or_default(),
            ]
        })
        .collect();
    pretty_table(
        &["ID", "Date", "Account", "Description", "Payee", "Amount", "Type", "Category"],
        data,
    )
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", transaction_table(&data));
    }
    Ok(())
}
