// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use familyfin::budget::{budget_progress, budget_summary, check_budget_alerts, compute_progress, summarize};
use familyfin::commands::{budgets, notifications};
use familyfin::models::{Budget, BudgetPeriod, Transaction, TransactionType};
use familyfin::{cli, db};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::str::FromStr;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn budget(id: i64, amount: &str, category_id: Option<i64>) -> Budget {
    Budget {
        id,
        name: format!("Budget {}", id),
        category_id,
        amount: dec(amount),
        period: BudgetPeriod::Monthly,
        alert_threshold: dec("80"),
        is_active: true,
    }
}

fn tx(id: i64, category_id: Option<i64>, date: NaiveDate, amount: &str, kind: TransactionType) -> Transaction {
    Transaction {
        id,
        account_id: 1,
        category_id,
        date,
        description: format!("tx {}", id),
        amount: dec(amount),
        transaction_type: kind,
        payee: None,
        reference: None,
        notes: None,
    }
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO accounts(id,name,type) VALUES (1,'Everyday','bank')", [])
        .unwrap();
    conn.execute("INSERT INTO categories(id,name) VALUES (1,'Groceries')", [])
        .unwrap();
    conn.execute("INSERT INTO categories(id,name) VALUES (2,'Fuel')", [])
        .unwrap();
    conn
}

fn insert_expense(conn: &Connection, category_id: i64, date: &str, amount: &str) {
    conn.execute(
        "INSERT INTO transactions(account_id,category_id,date,description,amount,transaction_type)
         VALUES (1,?1,?2,'shop',?3,'expense')",
        params![category_id, date, amount],
    )
    .unwrap();
}

fn insert_budget(conn: &Connection, name: &str, category_id: i64, amount: &str) -> i64 {
    conn.execute(
        "INSERT INTO budgets(name,category_id,amount,period) VALUES (?1,?2,?3,'monthly')",
        params![name, category_id, amount],
    )
    .unwrap();
    conn.last_insert_rowid()
}

#[test]
fn progress_counts_only_matching_expenses_in_window() {
    let now = d(2024, 3, 10);
    let rows = vec![
        tx(1, Some(1), d(2024, 3, 5), "40.00", TransactionType::Expense),
        tx(2, Some(1), d(2024, 3, 8), "45.00", TransactionType::Expense),
        tx(3, Some(2), d(2024, 3, 6), "30.00", TransactionType::Expense),
        tx(4, Some(1), d(2024, 3, 7), "500.00", TransactionType::Income),
        tx(5, Some(1), d(2024, 2, 28), "70.00", TransactionType::Expense),
    ];
    let p = compute_progress(&budget(1, "100", Some(1)), &rows, now);

    assert_eq!(p.spent, dec("85"));
    assert_eq!(p.remaining, dec("15"));
    assert_eq!(p.variance, dec("15"));
    assert_eq!(p.percentage, dec("85"));
    assert!(p.is_approaching_limit);
    assert!(!p.is_over_budget);
    assert_eq!(p.days_remaining, 21);
    assert_eq!(p.daily_allowance.round_dp(4), dec("0.7143"));
    let ids: Vec<i64> = p.transactions.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn budget_without_category_counts_every_expense() {
    let now = d(2024, 3, 10);
    let rows = vec![
        tx(1, Some(1), d(2024, 3, 5), "40", TransactionType::Expense),
        tx(2, Some(2), d(2024, 3, 6), "30", TransactionType::Expense),
        tx(3, None, d(2024, 3, 7), "5", TransactionType::Expense),
    ];
    let p = compute_progress(&budget(1, "200", None), &rows, now);
    assert_eq!(p.spent, dec("75"));
    assert!(!p.is_approaching_limit);
}

#[test]
fn overspend_floors_remaining_and_keeps_signed_variance() {
    let now = d(2024, 3, 10);
    let rows = vec![tx(1, Some(1), d(2024, 3, 2), "120", TransactionType::Expense)];
    let p = compute_progress(&budget(1, "100", Some(1)), &rows, now);
    assert_eq!(p.remaining, Decimal::ZERO);
    assert_eq!(p.variance, dec("-20"));
    assert!(p.is_over_budget);
    assert!(!p.is_approaching_limit);
    assert_eq!(p.daily_allowance, Decimal::ZERO);
}

#[test]
fn exactly_at_budget_counts_as_over() {
    let now = d(2024, 3, 10);
    let rows = vec![tx(1, Some(1), d(2024, 3, 2), "100", TransactionType::Expense)];
    let p = compute_progress(&budget(1, "100", Some(1)), &rows, now);
    assert_eq!(p.percentage, dec("100"));
    assert_eq!(p.variance, Decimal::ZERO);
    assert!(p.is_over_budget);
    assert!(!p.is_approaching_limit);
}

#[test]
fn huge_spend_against_tiny_budget_saturates_percentage() {
    let now = d(2024, 3, 10);
    let rows = vec![
        tx(1, Some(1), d(2024, 3, 2), "10000000000000000000000000", TransactionType::Expense),
        tx(2, Some(1), d(2024, 3, 3), "79228162514264337593543950335", TransactionType::Expense),
    ];
    let p = compute_progress(&budget(1, "0.0001", Some(1)), &rows, now);
    assert_eq!(p.spent, Decimal::MAX);
    assert_eq!(p.percentage, Decimal::MAX);
    assert_eq!(p.remaining, Decimal::ZERO);
    assert!(p.is_over_budget);
    assert!(!p.is_approaching_limit);

    let s = summarize(vec![p.clone(), p]);
    assert_eq!(s.total_spent, Decimal::MAX);
    assert_eq!(s.total_remaining, Decimal::ZERO);
    assert_eq!(s.over_budget_count, 2);
}

#[test]
fn zero_amount_budget_reports_zero_percent() {
    let now = d(2024, 3, 10);
    let rows = vec![tx(1, Some(1), d(2024, 3, 2), "10", TransactionType::Expense)];
    let p = compute_progress(&budget(1, "0", Some(1)), &rows, now);
    assert_eq!(p.percentage, Decimal::ZERO);
    assert_eq!(p.remaining, Decimal::ZERO);
    assert!(p.is_over_budget);
    assert!(!p.is_approaching_limit);
}

#[test]
fn last_day_of_period_has_no_daily_allowance() {
    let p = compute_progress(&budget(1, "100", Some(1)), &[], d(2024, 3, 31));
    assert_eq!(p.days_remaining, 0);
    assert_eq!(p.daily_allowance, Decimal::ZERO);
    assert_eq!(p.remaining, dec("100"));
}

#[test]
fn summary_floors_total_remaining_and_counts_flags() {
    let now = d(2024, 3, 10);
    let over = compute_progress(
        &budget(1, "100", Some(1)),
        &[tx(1, Some(1), d(2024, 3, 2), "150", TransactionType::Expense)],
        now,
    );
    let near = compute_progress(
        &budget(2, "50", Some(2)),
        &[tx(2, Some(2), d(2024, 3, 3), "45", TransactionType::Expense)],
        now,
    );
    let s = summarize(vec![over, near]);
    assert_eq!(s.total_budgeted, dec("150"));
    assert_eq!(s.total_spent, dec("195"));
    assert_eq!(s.total_remaining, Decimal::ZERO);
    assert_eq!(s.over_budget_count, 1);
    assert_eq!(s.approaching_limit_count, 1);
    assert_eq!(s.budgets.len(), 2);
}

#[test]
fn missing_budget_yields_no_progress() {
    let conn = setup();
    assert!(budget_progress(&conn, 42, d(2024, 3, 10)).unwrap().is_none());
}

#[test]
fn stored_progress_reads_period_expenses() {
    let conn = setup();
    let id = insert_budget(&conn, "Groceries", 1, "400.00");
    insert_expense(&conn, 1, "2024-03-01", "120.50");
    insert_expense(&conn, 1, "2024-03-09", "79.50");
    insert_expense(&conn, 1, "2024-02-29", "300.00");
    insert_expense(&conn, 2, "2024-03-04", "60.00");

    let p = budget_progress(&conn, id, d(2024, 3, 10)).unwrap().unwrap();
    assert_eq!(p.spent, dec("200.00"));
    assert_eq!(p.percentage, dec("50"));
    assert_eq!(p.period.start_date, d(2024, 3, 1));
    assert_eq!(p.period.end_date, d(2024, 3, 31));
    assert_eq!(p.transactions.len(), 2);
}

#[test]
fn summary_skips_inactive_budgets() {
    let conn = setup();
    insert_budget(&conn, "Groceries", 1, "400");
    let fuel = insert_budget(&conn, "Fuel", 2, "100");
    conn.execute("UPDATE budgets SET is_active=0 WHERE id=?1", params![fuel])
        .unwrap();
    let s = budget_summary(&conn, d(2024, 3, 10)).unwrap();
    assert_eq!(s.budgets.len(), 1);
    assert_eq!(s.total_budgeted, dec("400"));
}

#[test]
fn alerts_are_written_once_per_budget_per_day() {
    let conn = setup();
    let groceries = insert_budget(&conn, "Groceries", 1, "100");
    insert_budget(&conn, "Fuel", 2, "100");
    insert_expense(&conn, 1, "2024-03-02", "90");
    insert_expense(&conn, 2, "2024-03-02", "10");

    let day = d(2024, 3, 10);
    assert_eq!(check_budget_alerts(&conn, day).unwrap(), 1);
    assert_eq!(check_budget_alerts(&conn, day).unwrap(), 0);

    let stored = notifications::list_notifications(&conn, false).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].budget_id, groceries);
    assert_eq!(stored[0].kind, "approaching_limit");
    assert!(!stored[0].is_read);

    assert_eq!(check_budget_alerts(&conn, d(2024, 3, 11)).unwrap(), 1);
    assert_eq!(notifications::list_notifications(&conn, true).unwrap().len(), 2);
}

#[test]
fn over_budget_alert_kind() {
    let conn = setup();
    insert_budget(&conn, "Fuel", 2, "50");
    insert_expense(&conn, 2, "2024-03-02", "80");
    assert_eq!(check_budget_alerts(&conn, d(2024, 3, 10)).unwrap(), 1);
    let stored = notifications::list_notifications(&conn, false).unwrap();
    assert_eq!(stored[0].kind, "over_budget");
    assert!(stored[0].message.contains("Fuel"));
}

#[test]
fn fully_spent_budget_raises_over_budget_alert() {
    let conn = setup();
    insert_budget(&conn, "Groceries", 1, "100");
    insert_expense(&conn, 1, "2024-03-02", "100");
    assert_eq!(check_budget_alerts(&conn, d(2024, 3, 10)).unwrap(), 1);
    let stored = notifications::list_notifications(&conn, false).unwrap();
    assert_eq!(stored[0].kind, "over_budget");
}

#[test]
fn budget_add_uses_configured_default_threshold() {
    let conn = setup();
    familyfin::utils::set_setting(&conn, familyfin::utils::SETTING_ALERT_THRESHOLD, "65").unwrap();
    let matches = cli::build_cli().get_matches_from([
        "familyfin", "budget", "add", "--name", "Food", "--amount", "300", "--category",
        "Groceries", "--period", "weekly",
    ]);
    if let Some(("budget", budget_m)) = matches.subcommand() {
        budgets::handle(&conn, budget_m).unwrap();
    } else {
        panic!("no budget subcommand");
    }
    let (period, threshold): (String, String) = conn
        .query_row("SELECT period, alert_threshold FROM budgets WHERE name='Food'", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(period, "weekly");
    assert_eq!(threshold, "65");
}

#[test]
fn budget_add_rejects_threshold_above_hundred() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "familyfin", "budget", "add", "--name", "Food", "--amount", "300",
        "--alert-threshold", "120",
    ]);
    if let Some(("budget", budget_m)) = matches.subcommand() {
        assert!(budgets::handle(&conn, budget_m).is_err());
    } else {
        panic!("no budget subcommand");
    }
}
