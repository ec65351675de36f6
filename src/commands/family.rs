// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::FinanceError;
use crate::models::{Activity, BudgetPeriod, FamilyMember, SchoolFee};
use crate::store::decimal_col;
use crate::utils::{
    fmt_money, id_for_member, json_flags, maybe_print_json, opt_arg, parse_amount, parse_date,
    pretty_table, reference_day, req_arg,
};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req_arg(sub, "name")?;
            let relationship = req_arg(sub, "relationship")?;
            let birth_year = sub.get_one::<i32>("birth_year").copied();
            conn.execute(
                "INSERT INTO family_members(name, relationship, birth_year) VALUES (?1,?2,?3)",
                params![name, relationship, birth_year],
            )?;
            println!("Added {} '{}'", relationship, name);
        }
        Some(("list", _)) => {
            let data = fetch_members(conn)?
                .into_iter()
                .map(|m| {
                    vec![
                        m.name,
                        m.relationship,
                        m.birth_year.map(|y| y.to_string()).unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Name", "Relationship", "Born"], data)
            );
        }
        Some(("rm", sub)) => {
            let name = req_arg(sub, "name")?;
            let n = conn.execute("DELETE FROM family_members WHERE name=?1", params![name])?;
            if n == 0 {
                return Err(FinanceError::NotFound(format!("Family member '{}'", name)).into());
            }
            println!("Removed '{}'", name);
        }
        Some(("fee-add", sub)) => {
            let member_id = id_for_member(conn, &req_arg(sub, "member")?)?;
            let amount = parse_amount(&req_arg(sub, "amount")?)?;
            let due = parse_date(&req_arg(sub, "due")?)?;
            conn.execute(
                "INSERT INTO school_fees(member_id, school, term, amount, due_date) VALUES (?1,?2,?3,?4,?5)",
                params![
                    member_id,
                    req_arg(sub, "school")?,
                    req_arg(sub, "term")?,
                    amount.to_string(),
                    due
                ],
            )?;
            println!("Recorded school fee #{} of {}", conn.last_insert_rowid(), fmt_money(&amount));
        }
        Some(("fees", sub)) => fees(conn, sub)?,
        Some(("fee-paid", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let paid_on = match opt_arg(sub, "on") {
                Some(d) => parse_date(&d)?,
                None => reference_day(sub)?,
            };
            let n = conn.execute(
                "UPDATE school_fees SET paid_on=?1 WHERE id=?2",
                params![paid_on, id],
            )?;
            if n == 0 {
                return Err(FinanceError::NotFound(format!("School fee {}", id)).into());
            }
            println!("School fee {} paid on {}", id, paid_on);
        }
        Some(("activity-add", sub)) => {
            let member_id = id_for_member(conn, &req_arg(sub, "member")?)?;
            let cost = parse_amount(&req_arg(sub, "cost")?)?;
            let frequency: BudgetPeriod = req_arg(sub, "frequency")?.parse()?;
            let start = parse_date(&req_arg(sub, "start")?)?;
            let end = opt_arg(sub, "end").map(|d| parse_date(&d)).transpose()?;
            if end.is_some_and(|e| e < start) {
                return Err(anyhow!("Activity ends before it starts"));
            }
            conn.execute(
                "INSERT INTO activities(member_id, name, provider, cost, frequency, start_date, end_date)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)",
                params![
                    member_id,
                    req_arg(sub, "name")?,
                    opt_arg(sub, "provider"),
                    cost.to_string(),
                    frequency.as_str(),
                    start,
                    end
                ],
            )?;
            println!("Recorded activity #{}", conn.last_insert_rowid());
        }
        Some(("activities", sub)) => activities(conn, sub)?,
        Some(("costs", sub)) => costs(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn fetch_members(conn: &Connection) -> Result<Vec<FamilyMember>> {
    let mut stmt =
        conn.prepare("SELECT id, name, relationship, birth_year FROM family_members ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(FamilyMember {
            id: r.get(0)?,
            name: r.get(1)?,
            relationship: r.get(2)?,
            birth_year: r.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn fetch_fees(conn: &Connection, member_id: Option<i64>) -> Result<Vec<SchoolFee>> {
    let mut stmt = conn.prepare(
        "SELECT id, member_id, school, term, amount, due_date, paid_on FROM school_fees
         WHERE (?1 IS NULL OR member_id=?1) ORDER BY due_date, id",
    )?;
    let rows = stmt.query_map(params![member_id], |r| {
        Ok(SchoolFee {
            id: r.get(0)?,
            member_id: r.get(1)?,
            school: r.get(2)?,
            term: r.get(3)?,
            amount: decimal_col(r, 4)?,
            due_date: r.get(5)?,
            paid_on: r.get(6)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn fetch_activities(conn: &Connection, member_id: Option<i64>) -> Result<Vec<Activity>> {
    let mut stmt = conn.prepare(
        "SELECT id, member_id, name, provider, cost, frequency, start_date, end_date FROM activities
         WHERE (?1 IS NULL OR member_id=?1) ORDER BY start_date, id",
    )?;
    let rows = stmt.query_map(params![member_id], |r| {
        let frequency: String = r.get(5)?;
        Ok(Activity {
            id: r.get(0)?,
            member_id: r.get(1)?,
            name: r.get(2)?,
            provider: r.get(3)?,
            cost: decimal_col(r, 4)?,
            frequency: BudgetPeriod::parse_lenient(&frequency),
            start_date: r.get(6)?,
            end_date: r.get(7)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn member_filter(conn: &Connection, sub: &clap::ArgMatches) -> Result<Option<i64>> {
    opt_arg(sub, "member")
        .map(|m| id_for_member(conn, &m))
        .transpose()
}

fn fees(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let mut data = fetch_fees(conn, member_filter(conn, sub)?)?;
    if sub.get_flag("unpaid") {
        data.retain(|f| f.paid_on.is_none());
    }
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|f| {
            vec![
                f.id.to_string(),
                f.school.clone(),
                f.term.clone(),
                fmt_money(&f.amount),
                f.due_date.to_string(),
                f.paid_on.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "School", "Term", "Amount", "Due", "Paid"], rows)
    );
    Ok(())
}

fn activities(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = fetch_activities(conn, member_filter(conn, sub)?)?;
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.name.clone(),
                a.provider.clone().unwrap_or_default(),
                format!("{} {}", fmt_money(&a.cost), a.frequency),
                a.start_date.to_string(),
                a.end_date.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Activity", "Provider", "Cost", "Start", "End"], rows)
    );
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberCosts {
    pub member: String,
    pub outstanding_fees: Decimal,
    pub overdue_fees: Decimal,
    pub annual_activity_cost: Decimal,
}

pub fn activity_running(a: &Activity, on: NaiveDate) -> bool {
    a.start_date <= on && a.end_date.is_none_or(|end| on <= end)
}

/// Unpaid fees (and the overdue share of them) plus the yearly cost of the
/// activities running on `today`.
pub fn member_costs(
    member: &FamilyMember,
    fees: &[SchoolFee],
    activities: &[Activity],
    today: NaiveDate,
) -> MemberCosts {
    let unpaid = fees
        .iter()
        .filter(|f| f.member_id == member.id && f.paid_on.is_none());
    let outstanding_fees: Decimal = unpaid.clone().map(|f| f.amount).sum();
    let overdue_fees: Decimal = unpaid.filter(|f| f.due_date < today).map(|f| f.amount).sum();
    let annual_activity_cost: Decimal = activities
        .iter()
        .filter(|a| a.member_id == member.id && activity_running(a, today))
        .map(|a| a.cost * a.frequency.per_year())
        .sum();
    MemberCosts {
        member: member.name.clone(),
        outstanding_fees,
        overdue_fees,
        annual_activity_cost,
    }
}

fn costs(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let today = reference_day(sub)?;
    let fees = fetch_fees(conn, None)?;
    let acts = fetch_activities(conn, None)?;
    let data: Vec<MemberCosts> = fetch_members(conn)?
        .iter()
        .map(|m| member_costs(m, &fees, &acts, today))
        .collect();
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|c| {
            vec![
                c.member.clone(),
                fmt_money(&c.outstanding_fees),
                fmt_money(&c.overdue_fees),
                fmt_money(&c.annual_activity_cost),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Member", "Fees outstanding", "Overdue", "Activities / year"],
            rows
        )
    );
    Ok(())
}
