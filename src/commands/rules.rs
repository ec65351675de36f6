// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::FinanceError;
use crate::models::{MatchField, MatchType, Transaction, TransactionType};
use crate::rules::{apply_categorisation_rules, apply_rules};
use crate::store::fetch_rules;
use crate::utils::{id_for_category, pretty_table, req_arg};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let cat = req_arg(sub, "category")?;
            let field: MatchField = req_arg(sub, "field")?.parse()?;
            let match_type: MatchType = req_arg(sub, "match_type")?.parse()?;
            // not trimmed: leading/trailing spaces can be part of the pattern
            let value = sub
                .get_one::<String>("value")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("Rule value must not be empty"))?
                .clone();
            let priority = *sub.get_one::<i64>("priority").unwrap_or(&0);
            let cat_id = id_for_category(conn, &cat)?;
            conn.execute(
                "INSERT INTO categorisation_rules(category_id, match_field, match_type, match_value, priority)
                 VALUES (?1,?2,?3,?4,?5)",
                params![cat_id, field.as_str(), match_type.as_str(), value, priority],
            )?;
            let id = conn.last_insert_rowid();
            tracing::info!(rule_id = id, "rule added");
            println!(
                "Added rule #{}: {} {} '{}' -> {} (priority {})",
                id, field, match_type, value, cat, priority
            );
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.priority, r.match_field, r.match_type, r.match_value, c.name, r.is_active
                 FROM categorisation_rules r LEFT JOIN categories c ON c.id=r.category_id
                 ORDER BY r.priority, r.id",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, Option<String>>(5)?,
                    r.get::<_, bool>(6)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (id, prio, field, mt, value, cat, active) = row?;
                data.push(vec![
                    id.to_string(),
                    prio.to_string(),
                    field,
                    mt,
                    value,
                    cat.unwrap_or_default(),
                    if active { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!(
                "{}",
                pretty_table(
                    &["ID", "Priority", "Field", "Match", "Value", "Category", "Active"],
                    data
                )
            );
        }
        Some(("rm", sub)) => {
            let id = parse_rule_id(sub)?;
            let n = conn.execute("DELETE FROM categorisation_rules WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(FinanceError::NotFound(format!("Rule {}", id)).into());
            }
            println!("Removed rule {}", id);
        }
        Some(("toggle", sub)) => {
            let id = parse_rule_id(sub)?;
            conn.execute(
                "UPDATE categorisation_rules SET is_active = 1 - is_active WHERE id=?1",
                params![id],
            )?;
            let active: Option<bool> = conn
                .query_row(
                    "SELECT is_active FROM categorisation_rules WHERE id=?1",
                    params![id],
                    |r| r.get(0),
                )
                .optional()?;
            match active {
                Some(a) => println!(
                    "Rule {} is now {}",
                    id,
                    if a { "active" } else { "inactive" }
                ),
                None => return Err(FinanceError::NotFound(format!("Rule {}", id)).into()),
            }
        }
        Some(("apply", _)) => {
            let n = apply_categorisation_rules(conn)?;
            println!("Categorised {} transaction(s)", n);
        }
        Some(("test", sub)) => match matched_category(conn, sub)? {
            Some(name) => println!("Matched category '{}'", name),
            None => println!("No rule matched"),
        },
        _ => {}
    }
    Ok(())
}

/// Runs the active rules against a throwaway transaction built from the
/// arguments. Values are taken verbatim so whitespace-sensitive rules can be
/// exercised.
pub fn matched_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<Option<String>> {
    let sample = Transaction {
        id: 0,
        account_id: 0,
        category_id: None,
        date: chrono::Local::now().date_naive(),
        description: verbatim_arg(sub, "description").context("Missing --description")?,
        amount: Decimal::ZERO,
        transaction_type: TransactionType::Expense,
        payee: verbatim_arg(sub, "payee"),
        reference: verbatim_arg(sub, "reference"),
        notes: None,
    };
    let rules = fetch_rules(conn, true)?;
    let Some(cat_id) = apply_rules(&rules, &sample) else {
        return Ok(None);
    };
    let name = conn.query_row(
        "SELECT name FROM categories WHERE id=?1",
        params![cat_id],
        |r| r.get(0),
    )?;
    Ok(Some(name))
}

fn verbatim_arg(sub: &clap::ArgMatches, name: &str) -> Option<String> {
    sub.get_one::<String>(name).filter(|v| !v.is_empty()).cloned()
}

fn parse_rule_id(sub: &clap::ArgMatches) -> Result<i64> {
    let raw = req_arg(sub, "id")?;
    raw.parse::<i64>()
        .with_context(|| format!("Invalid rule id '{}'", raw))
}
