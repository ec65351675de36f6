// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use familyfin::commands::importer::{self, import_csv};
use familyfin::csv_import::{parse_bank_date, parse_money, parse_transactions, split_fields};
use familyfin::error::FinanceError;
use familyfin::models::TransactionType;
use familyfin::{cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Write;
use std::str::FromStr;
use tempfile::tempdir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO accounts(id,name,type) VALUES (1,'Everyday','bank')", [])
        .unwrap();
    conn.execute("INSERT INTO categories(id,name) VALUES (1,'Groceries')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO categorisation_rules(category_id,match_field,match_type,match_value) VALUES (1,'description','contains','WOOLWORTHS')",
        [],
    )
    .unwrap();
    conn
}

#[test]
fn single_amount_row() {
    let parsed = parse_transactions("Date,Description,Amount\n15/03/2024,Woolworths,45.20\n");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].date, d(2024, 3, 15));
    assert_eq!(parsed[0].description, "Woolworths");
    assert_eq!(parsed[0].amount, dec("45.20"));
    assert_eq!(parsed[0].transaction_type(), TransactionType::Income);
}

#[test]
fn quoted_comma_stays_in_description() {
    let parsed =
        parse_transactions("Date,Description,Amount\n16/03/2024,\"Coles, Southbank\",-12.00\n");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].description, "Coles, Southbank");
    assert_eq!(parsed[0].amount, dec("-12.00"));
    assert_eq!(parsed[0].transaction_type(), TransactionType::Expense);
    assert_eq!(parsed[0].magnitude(), dec("12.00"));
}

#[test]
fn zero_amount_and_bad_rows_are_dropped() {
    let raw = "Date,Description,Amount\n\
               01/03/2024,Transfer note,0.00\n\
               31/02/2024,Impossible day,10.00\n\
               March 3,Words for a date,10.00\n\
               04/03/2024,Too few\n\
               05/03/2024,,10.00\n\
               06/03/2024,Bakery,abc\n\
               07/03/2024,Kept,-3.50\n";
    let parsed = parse_transactions(raw);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].description, "Kept");
}

#[test]
fn debit_credit_layout_nets_credit_minus_debit() {
    let raw = "Date,Description,Debit,Credit\n\
               01/04/2024,Rent,1500.00,\n\
               02/04/2024,Salary,,3000.00\n";
    let parsed = parse_transactions(raw);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].amount, dec("-1500.00"));
    assert_eq!(parsed[1].amount, dec("3000.00"));
}

#[test]
fn overflowing_debit_credit_row_is_dropped() {
    let raw = "Date,Description,Debit,Credit\n\
               01/03/2024,Big,79228162514264337593543950335,-79228162514264337593543950335\n\
               02/03/2024,Bakery,8.00,\n";
    let parsed = parse_transactions(raw);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].description, "Bakery");
    assert_eq!(parsed[0].amount, dec("-8.00"));
}

#[test]
fn header_only_blank_lines_and_crlf() {
    assert!(parse_transactions("Date,Description,Amount\n").is_empty());
    assert!(parse_transactions("").is_empty());
    let parsed =
        parse_transactions("Date,Description,Amount\r\n\r\n2024-03-01,Fuel,-60.00\r\n\n");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].date, d(2024, 3, 1));
}

#[test]
fn date_formats() {
    assert_eq!(parse_bank_date("5/3/2024"), Some(d(2024, 3, 5)));
    assert_eq!(parse_bank_date("2024-03-05"), Some(d(2024, 3, 5)));
    assert_eq!(parse_bank_date("05-03-2024"), Some(d(2024, 3, 5)));
    assert_eq!(parse_bank_date(" 29/02/2024 "), Some(d(2024, 2, 29)));
    assert_eq!(parse_bank_date("29/02/2023"), None);
    assert_eq!(parse_bank_date("03/15/24"), None);
}

#[test]
fn money_cleanup() {
    assert_eq!(parse_money("$1,234.50"), Some(dec("1234.50")));
    assert_eq!(parse_money("-$45.20"), Some(dec("-45.20")));
    assert_eq!(parse_money(""), Some(Decimal::ZERO));
    assert_eq!(parse_money("1.2.3"), None);
    let parsed = parse_transactions("Date,Description,Amount\n01/05/2024,TV,\"$1,234.50\"\n");
    assert_eq!(parsed[0].amount, dec("1234.50"));
}

#[test]
fn split_fields_trims_and_drops_quotes() {
    assert_eq!(
        split_fields(" a , \"b, c\" ,d"),
        vec!["a".to_string(), "b, c".to_string(), "d".to_string()]
    );
}

#[test]
fn import_stores_magnitudes_and_applies_rules() {
    let mut conn = setup();
    let raw = "Date,Description,Amount\n\
               15/03/2024,WOOLWORTHS 1234 MELBOURNE,-45.20\n\
               16/03/2024,Salary,2500.00\n";
    let report = import_csv(&mut conn, raw, 1).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.categorised, 1);

    let mut stmt = conn
        .prepare("SELECT description, amount, transaction_type, category_id FROM transactions ORDER BY date")
        .unwrap();
    let rows: Vec<(String, String, String, Option<i64>)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(
        rows[0],
        ("WOOLWORTHS 1234 MELBOURNE".into(), "45.20".into(), "expense".into(), Some(1))
    );
    assert_eq!(rows[1], ("Salary".into(), "2500.00".into(), "income".into(), None));
}

#[test]
fn import_with_nothing_parsed_fails_and_writes_nothing() {
    let mut conn = setup();
    let err = import_csv(&mut conn, "Date,Description,Amount\nnot,a,row\n", 1).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FinanceError>(),
        Some(FinanceError::NoTransactionsParsed)
    ));
    assert_eq!(err.to_string(), "Could not parse any transactions");
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn import_csv_from_cli() {
    let mut conn = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("statement.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "Date,Description,Debit,Credit").unwrap();
    writeln!(f, "01/04/2024,WOOLWORTHS METRO,32.10,").unwrap();
    writeln!(f, "02/04/2024,Refund,,12.00").unwrap();
    drop(f);

    let matches = cli::build_cli().get_matches_from([
        "familyfin",
        "import",
        "csv",
        "--path",
        path.to_str().unwrap(),
        "--account",
        "Everyday",
    ]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions WHERE category_id=1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(total, 2);
}

#[test]
fn dry_run_saves_nothing() {
    let mut conn = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("statement.csv");
    std::fs::write(&path, "Date,Description,Amount\n01/04/2024,Bakery,-8.00\n").unwrap();

    let matches = cli::build_cli().get_matches_from([
        "familyfin",
        "import",
        "csv",
        "--path",
        path.to_str().unwrap(),
        "--account",
        "Everyday",
        "--dry-run",
    ]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(total, 0);
}

#[test]
fn latin1_statement_still_imports() {
    let mut conn = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("statement.csv");
    std::fs::write(&path, b"Date,Description,Amount\n01/04/2024,Caf\xe9 Roma,-8.00\n").unwrap();

    let matches = cli::build_cli().get_matches_from([
        "familyfin",
        "import",
        "csv",
        "--path",
        path.to_str().unwrap(),
        "--account",
        "Everyday",
    ]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    let description: String = conn
        .query_row("SELECT description FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert!(description.starts_with("Caf"));
    assert!(description.ends_with(" Roma"));
}
