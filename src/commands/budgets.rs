// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::budget::{BudgetProgress, budget_progress, budget_summary, check_budget_alerts};
use crate::error::FinanceError;
use crate::models::BudgetPeriod;
use crate::store::{fetch_budgets, fetch_categories};
use crate::utils::{
    default_alert_threshold, fmt_money, id_for_category, json_flags, maybe_print_json, opt_arg,
    parse_amount, parse_decimal, pretty_table, reference_day, req_arg,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("progress", sub)) => progress(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("alerts", sub)) => {
            let today = reference_day(sub)?;
            let n = check_budget_alerts(conn, today)?;
            println!("{} new alert(s) for {}", n, today);
        }
        Some(("deactivate", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let n = conn.execute("UPDATE budgets SET is_active=0 WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(FinanceError::NotFound(format!("Budget {}", id)).into());
            }
            tracing::info!(budget_id = id, "budget deactivated");
            println!("Deactivated budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = req_arg(sub, "name")?;
    let amount = parse_amount(&req_arg(sub, "amount")?)?;
    let period: BudgetPeriod = req_arg(sub, "period")?.parse()?;
    let category_id = match opt_arg(sub, "category") {
        Some(c) => Some(id_for_category(conn, &c)?),
        None => None,
    };
    let threshold = match opt_arg(sub, "alert_threshold") {
        Some(t) => parse_decimal(&t)?,
        None => default_alert_threshold(conn)?,
    };
    if threshold.is_sign_negative() || threshold > Decimal::ONE_HUNDRED {
        return Err(anyhow!("Alert threshold must be between 0 and 100"));
    }
    conn.execute(
        "INSERT INTO budgets(name, category_id, amount, period, alert_threshold) VALUES (?1,?2,?3,?4,?5)",
        params![
            name,
            category_id,
            amount.to_string(),
            period.as_str(),
            threshold.to_string()
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(budget_id = id, "budget created");
    println!(
        "Budget #{} '{}' = {} {} (alert at {}%)",
        id,
        name,
        fmt_money(&amount),
        period,
        threshold
    );
    Ok(())
}

fn category_names(conn: &Connection) -> Result<HashMap<i64, String>> {
    Ok(fetch_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let budgets = fetch_budgets(conn, !sub.get_flag("all"))?;
    if maybe_print_json(json_flag, jsonl_flag, &budgets)? {
        return Ok(());
    }
    let names = category_names(conn)?;
    let data = budgets
        .iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                b.name.clone(),
                b.category_id
                    .and_then(|id| names.get(&id).cloned())
                    .unwrap_or_else(|| "(all expenses)".into()),
                b.period.to_string(),
                fmt_money(&b.amount),
                format!("{}%", b.alert_threshold),
                if b.is_active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Category", "Period", "Amount", "Alert", "Active"],
            data
        )
    );
    Ok(())
}

fn status(p: &BudgetProgress) -> &'static str {
    if p.is_over_budget {
        "OVER"
    } else if p.is_approaching_limit {
        "near limit"
    } else {
        "ok"
    }
}

fn progress_row(p: &BudgetProgress) -> Vec<String> {
    vec![
        p.budget.name.clone(),
        format!("{} .. {}", p.period.start_date, p.period.end_date),
        fmt_money(&p.budget.amount),
        fmt_money(&p.spent),
        fmt_money(&p.variance),
        format!("{:.1}%", p.percentage),
        p.days_remaining.to_string(),
        fmt_money(&p.daily_allowance),
        status(p).to_string(),
    ]
}

const PROGRESS_HEADERS: [&str; 9] = [
    "Budget", "Period", "Amount", "Spent", "Left", "Used", "Days", "Per day", "Status",
];

fn progress(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let id = *sub.get_one::<i64>("id").context("Missing --id")?;
    let today = reference_day(sub)?;
    let Some(p) = budget_progress(conn, id, today)? else {
        println!("No progress available for budget {}", id);
        return Ok(());
    };
    if !maybe_print_json(json_flag, jsonl_flag, &p)? {
        println!("{}", pretty_table(&PROGRESS_HEADERS, vec![progress_row(&p)]));
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let today = reference_day(sub)?;
    let s = budget_summary(conn, today)?;
    if maybe_print_json(json_flag, jsonl_flag, &s)? {
        return Ok(());
    }
    let rows = s.budgets.iter().map(progress_row).collect();
    println!("{}", pretty_table(&PROGRESS_HEADERS, rows));
    println!(
        "Budgeted {} | Spent {} | Remaining {} | Over: {} | Near limit: {}",
        fmt_money(&s.total_budgeted),
        fmt_money(&s.total_spent),
        fmt_money(&s.total_remaining),
        s.over_budget_count,
        s.approaching_limit_count
    );
    Ok(())
}
