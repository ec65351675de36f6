// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Lenient bank-export CSV parsing.
//!
//! Bank exports disagree on date format and on whether money moves through a
//! single signed column or a debit/credit pair, so both are inferred per row.
//! Rows that cannot be understood are dropped, never reported as errors.

use crate::models::TransactionType;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

static DMY_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("static regex"));
static YMD_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("static regex"));
static DMY_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})$").expect("static regex"));
static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Signed: positive money in, negative money out.
    pub amount: Decimal,
}

impl ParsedTransaction {
    pub fn transaction_type(&self) -> TransactionType {
        if self.amount.is_sign_negative() {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }

    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }
}

/// Splits on commas outside double quotes. Quote characters are dropped and
/// fields trimmed; doubled quotes are not treated as escapes.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Tries `DD/MM/YYYY`, `YYYY-MM-DD`, then `DD-MM-YYYY`. The first pattern that
/// matches decides; an impossible calendar date yields `None`.
pub fn parse_bank_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let (y, m, d) = if let Some(c) = DMY_SLASH.captures(raw) {
        (c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
    } else if let Some(c) = YMD_DASH.captures(raw) {
        (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
    } else if let Some(c) = DMY_DASH.captures(raw) {
        (c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Strips currency symbols, thousands separators and spaces. An empty column
/// counts as zero; anything left that is not a number yields `None`.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    cleaned.parse::<Decimal>().ok()
}

fn parse_row(fields: &[String]) -> Option<ParsedTransaction> {
    if fields.len() < 3 {
        return None;
    }
    let date = parse_bank_date(&fields[0])?;
    let description = fields[1].clone();
    let amount = if fields.len() >= 4 {
        let debit = parse_money(&fields[2])?;
        let credit = parse_money(&fields[3])?;
        credit.checked_sub(debit)?
    } else {
        parse_money(&fields[2])?
    };
    if amount.is_zero() || description.is_empty() {
        return None;
    }
    Some(ParsedTransaction {
        date,
        description,
        amount,
    })
}

/// The first line is a header. Never fails; unusable rows are skipped.
pub fn parse_transactions(raw: &str) -> Vec<ParsedTransaction> {
    let mut out = Vec::new();
    for (idx, line) in raw.lines().enumerate().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(&split_fields(line)) {
            Some(p) => out.push(p),
            None => tracing::warn!(line = idx + 1, "dropping unparseable CSV row"),
        }
    }
    out
}
