// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Grouped spending totals behind the category and payee charts.

use crate::error::FinanceError;
use crate::models::{Category, Transaction};
use crate::store::TransactionRow;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

pub const CHART_TOP_N: usize = 8;
pub const UNCATEGORISED: &str = "Uncategorised";
pub const UNKNOWN_PAYEE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Category,
    Payee,
}

impl FromStr for GroupBy {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(GroupBy::Category),
            "payee" => Ok(GroupBy::Payee),
            other => Err(FinanceError::InvalidInput(format!(
                "Unknown grouping '{}' (use category|payee)",
                other
            ))),
        }
    }
}

/// A category name split on its first `:` into parent and child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryPath {
    pub parent: String,
    pub child: Option<String>,
}

impl CategoryPath {
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((parent, child)) => CategoryPath {
                parent: parent.trim().to_string(),
                child: Some(child.trim().to_string()),
            },
            None => CategoryPath {
                parent: name.trim().to_string(),
                child: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartChild {
    pub label: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartGroup {
    pub label: String,
    pub total: Decimal,
    pub pct_of_max: Decimal,
    pub pct_of_total: Decimal,
    pub children: Vec<ChartChild>,
}

fn sort_desc<T>(items: &mut [T], key: impl Fn(&T) -> (Decimal, &str)) {
    items.sort_by(|a, b| {
        let (ta, la) = key(a);
        let (tb, lb) = key(b);
        tb.cmp(&ta).then_with(|| la.cmp(lb))
    });
}

fn with_percentages(mut groups: Vec<ChartGroup>) -> Vec<ChartGroup> {
    let max = groups.iter().map(|g| g.total).max().unwrap_or(Decimal::ZERO);
    let sum: Decimal = groups.iter().map(|g| g.total).sum();
    for g in &mut groups {
        g.pct_of_max = if max.is_zero() {
            Decimal::ZERO
        } else {
            g.total / max * Decimal::ONE_HUNDRED
        };
        g.pct_of_total = if sum.is_zero() {
            Decimal::ZERO
        } else {
            g.total / sum * Decimal::ONE_HUNDRED
        };
    }
    groups
}

/// Rolls `Parent:Child` totals up into parent groups, largest first. Not
/// truncated; precomputed summaries are shown in full.
pub fn group_by_category(totals: &[CategoryTotal]) -> Vec<ChartGroup> {
    let mut parents: BTreeMap<String, (Decimal, BTreeMap<String, Decimal>)> = BTreeMap::new();
    for t in totals {
        let path = CategoryPath::parse(&t.name);
        let entry = parents
            .entry(path.parent)
            .or_insert_with(|| (Decimal::ZERO, BTreeMap::new()));
        entry.0 += t.amount;
        if let Some(child) = path.child {
            *entry.1.entry(child).or_insert(Decimal::ZERO) += t.amount;
        }
    }

    let mut groups: Vec<ChartGroup> = parents
        .into_iter()
        .map(|(label, (total, children))| {
            let mut children: Vec<ChartChild> = children
                .into_iter()
                .map(|(label, total)| ChartChild { label, total })
                .collect();
            sort_desc(&mut children, |c| (c.total, c.label.as_str()));
            ChartGroup {
                label,
                total,
                pct_of_max: Decimal::ZERO,
                pct_of_total: Decimal::ZERO,
                children,
            }
        })
        .collect();
    sort_desc(&mut groups, |g| (g.total, g.label.as_str()));
    with_percentages(groups)
}

/// Category chart from a full transaction list; keeps the top
/// [`CHART_TOP_N`] groups. Percentages are relative to every group.
pub fn group_transactions_by_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<ChartGroup> {
    let names: HashMap<i64, &str> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();
    let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
    for t in transactions {
        let name = t
            .category_id
            .and_then(|id| names.get(&id).copied())
            .unwrap_or(UNCATEGORISED);
        *sums.entry(name).or_insert(Decimal::ZERO) += t.amount;
    }
    let totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(name, amount)| CategoryTotal {
            name: name.to_string(),
            amount,
        })
        .collect();
    let mut groups = group_by_category(&totals);
    groups.truncate(CHART_TOP_N);
    groups
}

/// Payee, else description, else `"Unknown"`.
pub fn payee_label(t: &Transaction) -> &str {
    t.payee
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .or_else(|| Some(t.description.trim()).filter(|d| !d.is_empty()))
        .unwrap_or(UNKNOWN_PAYEE)
}

/// Payee chart, largest first, top [`CHART_TOP_N`].
pub fn group_by_payee(transactions: &[Transaction]) -> Vec<ChartGroup> {
    let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
    for t in transactions {
        *sums.entry(payee_label(t)).or_insert(Decimal::ZERO) += t.amount;
    }
    let mut groups: Vec<ChartGroup> = sums
        .into_iter()
        .map(|(label, total)| ChartGroup {
            label: label.to_string(),
            total,
            pct_of_max: Decimal::ZERO,
            pct_of_total: Decimal::ZERO,
            children: Vec::new(),
        })
        .collect();
    sort_desc(&mut groups, |g| (g.total, g.label.as_str()));
    let mut groups = with_percentages(groups);
    groups.truncate(CHART_TOP_N);
    groups
}

/// Whether a row contributes to the chart entry `key`. A category key may name
/// a parent group (`Shopping`) or a single child (`Shopping:Clothes`).
pub fn row_in_group(row: &TransactionRow, group_by: GroupBy, key: &str) -> bool {
    match group_by {
        GroupBy::Category => {
            let name = row.category.as_deref().unwrap_or(UNCATEGORISED);
            if name == key {
                return true;
            }
            let path = CategoryPath::parse(name);
            let wanted = CategoryPath::parse(key);
            match wanted.child {
                Some(_) => path == wanted,
                None => path.parent == wanted.parent,
            }
        }
        GroupBy::Payee => payee_label(&row.transaction) == key,
    }
}

/// The rows behind one chart entry, in the order given.
pub fn rows_for_group(rows: Vec<TransactionRow>, group_by: GroupBy, key: &str) -> Vec<TransactionRow> {
    rows.into_iter()
        .filter(|r| row_in_group(r, group_by, key))
        .collect()
}

/// Explicit parent -> children view over the textual hierarchy.
pub fn category_tree(categories: &[Category]) -> BTreeMap<String, Vec<&Category>> {
    let mut tree: BTreeMap<String, Vec<&Category>> = BTreeMap::new();
    for c in categories {
        let path = CategoryPath::parse(&c.name);
        let children = tree.entry(path.parent).or_default();
        if path.child.is_some() {
            children.push(c);
        }
    }
    tree
}
