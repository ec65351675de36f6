// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use familyfin::chart::{
    CHART_TOP_N, CategoryPath, CategoryTotal, GroupBy, UNCATEGORISED, category_tree,
    group_by_category, group_by_payee, group_transactions_by_category, payee_label,
};
use familyfin::commands::reports::chart_groups;
use familyfin::commands::transactions;
use familyfin::models::{Category, CategoryType, Transaction, TransactionType};
use familyfin::store::TransactionFilter;
use familyfin::{cli, db};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn total(name: &str, amount: i64) -> CategoryTotal {
    CategoryTotal {
        name: name.to_string(),
        amount: Decimal::from(amount),
    }
}

fn tx(id: i64, category_id: Option<i64>, description: &str, payee: Option<&str>, amount: i64) -> Transaction {
    Transaction {
        id,
        account_id: 1,
        category_id,
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        description: description.to_string(),
        amount: Decimal::from(amount),
        transaction_type: TransactionType::Expense,
        payee: payee.map(str::to_string),
        reference: None,
        notes: None,
    }
}

fn category(id: i64, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        category_type: CategoryType::Expense,
    }
}

#[test]
fn children_roll_up_into_parent() {
    let groups = group_by_category(&[total("Shopping:Clothes", 50), total("Shopping:Electronics", 150)]);
    assert_eq!(groups.len(), 1);
    let shopping = &groups[0];
    assert_eq!(shopping.label, "Shopping");
    assert_eq!(shopping.total, Decimal::from(200));
    let labels: Vec<&str> = shopping.children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Electronics", "Clothes"]);
    assert_eq!(shopping.pct_of_max, Decimal::ONE_HUNDRED);
    assert_eq!(shopping.pct_of_total, Decimal::ONE_HUNDRED);
}

#[test]
fn groups_sorted_largest_first_with_percentages() {
    let groups = group_by_category(&[
        total("Fuel", 50),
        total("Groceries", 100),
        total("Groceries:Butcher", 100),
        total("Health", 50),
    ]);
    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["Groceries", "Fuel", "Health"]);
    assert_eq!(groups[0].total, Decimal::from(200));
    assert_eq!(groups[0].children.len(), 1);
    assert_eq!(groups[1].pct_of_max, Decimal::from(25));
    assert_eq!(groups[1].pct_of_total.round_dp(1), Decimal::new(167, 1));
}

#[test]
fn precomputed_totals_are_not_truncated() {
    let totals: Vec<CategoryTotal> = (1..=10).map(|i| total(&format!("Cat{}", i), i)).collect();
    assert_eq!(group_by_category(&totals).len(), 10);
}

#[test]
fn transaction_chart_keeps_top_groups_and_labels_uncategorised() {
    let categories: Vec<Category> = (1..=10).map(|i| category(i, &format!("Cat{:02}", i))).collect();
    let mut rows: Vec<Transaction> = (1..=10).map(|i| tx(i, Some(i), "x", None, i * 10)).collect();
    rows.push(tx(11, None, "mystery", None, 1000));

    let groups = group_transactions_by_category(&rows, &categories);
    assert_eq!(groups.len(), CHART_TOP_N);
    assert_eq!(groups[0].label, UNCATEGORISED);
    assert_eq!(groups[1].label, "Cat10");
    // shares are taken over every group, not just the ones shown
    let shown: Decimal = groups.iter().map(|g| g.pct_of_total).sum();
    assert!(shown < Decimal::ONE_HUNDRED);
}

#[test]
fn payee_falls_back_to_description_then_unknown() {
    assert_eq!(payee_label(&tx(1, None, "Card purchase", Some("Bunnings"), 1)), "Bunnings");
    assert_eq!(payee_label(&tx(2, None, "Card purchase", Some("  "), 1)), "Card purchase");
    assert_eq!(payee_label(&tx(3, None, "Card purchase", None, 1)), "Card purchase");
    assert_eq!(payee_label(&tx(4, None, "", None, 1)), "Unknown");
}

#[test]
fn payee_chart_merges_and_truncates() {
    let mut rows = vec![
        tx(1, None, "a", Some("Bunnings"), 30),
        tx(2, None, "Bunnings", None, 20),
    ];
    for i in 0..9 {
        rows.push(tx(10 + i, None, &format!("Shop{}", i), None, 1 + i));
    }
    let groups = group_by_payee(&rows);
    assert_eq!(groups.len(), CHART_TOP_N);
    assert_eq!(groups[0].label, "Bunnings");
    assert_eq!(groups[0].total, Decimal::from(50));
    assert!(groups[0].children.is_empty());
}

#[test]
fn category_path_and_tree() {
    assert_eq!(
        CategoryPath::parse("Kids : School"),
        CategoryPath {
            parent: "Kids".into(),
            child: Some("School".into())
        }
    );
    assert_eq!(CategoryPath::parse("Fuel").child, None);

    let cats = vec![category(1, "Kids"), category(2, "Kids:School"), category(3, "Kids:Sport"), category(4, "Fuel")];
    let tree = category_tree(&cats);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree["Kids"].len(), 2);
    assert!(tree["Fuel"].is_empty());
}

#[test]
fn group_by_parses() {
    assert_eq!(" Payee ".parse::<GroupBy>().unwrap(), GroupBy::Payee);
    assert!("account".parse::<GroupBy>().is_err());
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO accounts(id,name,type) VALUES (1,'Everyday','bank')", [])
        .unwrap();
    for (id, name) in [(1, "Shopping:Clothes"), (2, "Shopping:Electronics"), (3, "Fuel")] {
        conn.execute("INSERT INTO categories(id,name) VALUES (?1,?2)", params![id, name])
            .unwrap();
    }
    let rows = [
        (Some(1_i64), "Myer", "50", "expense"),
        (Some(2), "JB Hi-Fi", "150", "expense"),
        (Some(3), "BP", "60", "expense"),
        (None, "Salary", "3000", "income"),
    ];
    for (cat, desc, amount, kind) in rows {
        conn.execute(
            "INSERT INTO transactions(account_id,category_id,date,description,amount,transaction_type)
             VALUES (1,?1,'2024-03-05',?2,?3,?4)",
            params![cat, desc, amount, kind],
        )
        .unwrap();
    }
    conn
}

#[test]
fn stored_chart_uses_expenses() {
    let conn = setup();
    let filter = TransactionFilter {
        transaction_type: Some(TransactionType::Expense),
        ..TransactionFilter::default()
    };
    let groups = chart_groups(&conn, &filter, GroupBy::Category).unwrap();
    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["Shopping", "Fuel"]);
    assert_eq!(groups[0].total, Decimal::from(200));
}

#[test]
fn drill_down_rows_match_the_group() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "familyfin", "chart", "rows", "--group-by", "category", "--key", "Shopping", "--type",
        "expense",
    ]);
    let Some(("chart", chart_m)) = matches.subcommand() else {
        panic!("no chart subcommand");
    };
    let Some(("rows", rows_m)) = chart_m.subcommand() else {
        panic!("no rows subcommand");
    };
    let rows = transactions::query_rows(&conn, rows_m).unwrap();
    let picked = familyfin::chart::rows_for_group(rows, GroupBy::Category, "Shopping");
    let total: Decimal = picked.iter().map(|r| r.transaction.amount).sum();
    assert_eq!(picked.len(), 2);
    assert_eq!(total, Decimal::from(200));

    let rows = transactions::query_rows(&conn, rows_m).unwrap();
    let clothes = familyfin::chart::rows_for_group(rows, GroupBy::Category, "Shopping:Clothes");
    assert_eq!(clothes.len(), 1);
    assert_eq!(clothes[0].transaction.description, "Myer");
}
