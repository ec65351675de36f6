// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Data-access layer: row mapping plus the handful of filtered queries and
//! writes the computation modules need.

use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    Budget, BudgetPeriod, CategorisationRule, Category, Transaction, TransactionType,
};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

pub const TX_COLUMNS: &str = "t.id, t.account_id, t.category_id, t.date, t.description, t.amount, t.transaction_type, t.payee, t.reference, t.notes";

const BUDGET_COLUMNS: &str =
    "id, name, category_id, amount, period, alert_threshold, is_active";

const RULE_COLUMNS: &str =
    "id, category_id, match_field, match_type, match_value, is_active, priority";

pub fn decimal_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn enum_col<T>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = FinanceError>,
{
    let s: String = r.get(idx)?;
    s.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Expects the columns in `TX_COLUMNS` order starting at `offset`.
pub fn transaction_from_row(r: &Row<'_>, offset: usize) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(offset)?,
        account_id: r.get(offset + 1)?,
        category_id: r.get(offset + 2)?,
        date: r.get(offset + 3)?,
        description: r.get(offset + 4)?,
        amount: decimal_col(r, offset + 5)?,
        transaction_type: enum_col(r, offset + 6)?,
        payee: r.get(offset + 7)?,
        reference: r.get(offset + 8)?,
        notes: r.get(offset + 9)?,
    })
}

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    let period: String = r.get(4)?;
    Ok(Budget {
        id: r.get(0)?,
        name: r.get(1)?,
        category_id: r.get(2)?,
        amount: decimal_col(r, 3)?,
        period: BudgetPeriod::parse_lenient(&period),
        alert_threshold: decimal_col(r, 5)?,
        is_active: r.get(6)?,
    })
}

fn rule_from_row(r: &Row<'_>) -> rusqlite::Result<CategorisationRule> {
    Ok(CategorisationRule {
        id: r.get(0)?,
        category_id: r.get(1)?,
        match_field: enum_col(r, 2)?,
        match_type: enum_col(r, 3)?,
        match_value: r.get(4)?,
        is_active: r.get(5)?,
        priority: r.get(6)?,
    })
}

pub fn fetch_budget(conn: &Connection, id: i64) -> FinanceResult<Option<Budget>> {
    let sql = format!("SELECT {} FROM budgets WHERE id=?1", BUDGET_COLUMNS);
    let b = conn.query_row(&sql, params![id], budget_from_row).optional()?;
    Ok(b)
}

pub fn fetch_budgets(conn: &Connection, active_only: bool) -> FinanceResult<Vec<Budget>> {
    let sql = if active_only {
        format!(
            "SELECT {} FROM budgets WHERE is_active=1 ORDER BY name, id",
            BUDGET_COLUMNS
        )
    } else {
        format!("SELECT {} FROM budgets ORDER BY name, id", BUDGET_COLUMNS)
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], budget_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Expense rows dated within `[start, end]`, optionally limited to one category.
pub fn expenses_between(
    conn: &Connection,
    category_id: Option<i64>,
    start: NaiveDate,
    end: NaiveDate,
) -> FinanceResult<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {} FROM transactions t WHERE t.transaction_type='expense' AND t.date>=?1 AND t.date<=?2",
        TX_COLUMNS
    );
    let mut out = Vec::new();
    if let Some(cid) = category_id {
        sql.push_str(" AND t.category_id=?3 ORDER BY t.date, t.id");
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![start, end, cid], |r| transaction_from_row(r, 0))?;
        for row in rows {
            out.push(row?);
        }
    } else {
        sql.push_str(" ORDER BY t.date, t.id");
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![start, end], |r| transaction_from_row(r, 0))?;
        for row in rows {
            out.push(row?);
        }
    }
    tracing::debug!(?category_id, %start, %end, rows = out.len(), "fetched expenses");
    Ok(out)
}

pub fn fetch_categories(conn: &Connection) -> FinanceResult<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, category_type FROM categories ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
            category_type: enum_col(r, 2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn fetch_rules(conn: &Connection, active_only: bool) -> FinanceResult<Vec<CategorisationRule>> {
    let filter = if active_only { " WHERE is_active=1" } else { "" };
    let sql = format!(
        "SELECT {} FROM categorisation_rules{} ORDER BY priority, id",
        RULE_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], rule_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn fetch_transaction(conn: &Connection, id: i64) -> FinanceResult<Option<Transaction>> {
    let sql = format!("SELECT {} FROM transactions t WHERE t.id=?1", TX_COLUMNS);
    let t = conn
        .query_row(&sql, params![id], |r| transaction_from_row(r, 0))
        .optional()?;
    Ok(t)
}

pub fn uncategorised_transactions(conn: &Connection) -> FinanceResult<Vec<Transaction>> {
    let sql = format!(
        "SELECT {} FROM transactions t WHERE t.category_id IS NULL ORDER BY t.date, t.id",
        TX_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |r| transaction_from_row(r, 0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub payee: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Unsaved view used for rule matching before the row exists.
    pub fn as_transaction(&self) -> Transaction {
        Transaction {
            id: 0,
            account_id: self.account_id,
            category_id: self.category_id,
            date: self.date,
            description: self.description.clone(),
            amount: self.amount,
            transaction_type: self.transaction_type,
            payee: self.payee.clone(),
            reference: self.reference.clone(),
            notes: self.notes.clone(),
        }
    }
}

pub fn insert_transaction(conn: &Connection, t: &NewTransaction) -> FinanceResult<i64> {
    conn.execute(
        "INSERT INTO transactions(account_id, category_id, date, description, amount, transaction_type, payee, reference, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            t.account_id,
            t.category_id,
            t.date,
            t.description,
            t.amount.to_string(),
            t.transaction_type.as_str(),
            t.payee,
            t.reference,
            t.notes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_transaction_category(
    conn: &Connection,
    id: i64,
    category_id: Option<i64>,
) -> FinanceResult<usize> {
    let n = conn.execute(
        "UPDATE transactions SET category_id=?1 WHERE id=?2",
        params![category_id, id],
    )?;
    Ok(n)
}

/// Columns a bulk edit may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkField {
    Category,
    Payee,
    Description,
}

impl BulkField {
    fn column(&self) -> &'static str {
        match self {
            BulkField::Category => "category_id",
            BulkField::Payee => "payee",
            BulkField::Description => "description",
        }
    }
}

fn placeholders(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(",")
}

/// One statement for the whole batch; returns rows affected.
pub fn bulk_update(
    conn: &Connection,
    ids: &[i64],
    field: BulkField,
    value: &dyn ToSql,
) -> FinanceResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "UPDATE transactions SET {}=?1 WHERE id IN ({})",
        field.column(),
        placeholders(2, ids.len())
    );
    let mut values: Vec<&dyn ToSql> = Vec::with_capacity(ids.len() + 1);
    values.push(value);
    values.extend(ids.iter().map(|id| id as &dyn ToSql));
    let n = conn.execute(&sql, params_from_iter(values))?;
    tracing::info!(field = field.column(), requested = ids.len(), updated = n, "bulk update");
    Ok(n)
}

pub fn bulk_delete(conn: &Connection, ids: &[i64]) -> FinanceResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM transactions WHERE id IN ({})",
        placeholders(1, ids.len())
    );
    let n = conn.execute(&sql, params_from_iter(ids.iter()))?;
    tracing::info!(requested = ids.len(), deleted = n, "bulk delete");
    Ok(n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Amount,
    Description,
}

impl FromStr for SortKey {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "amount" => Ok(SortKey::Amount),
            "description" => Ok(SortKey::Description),
            other => Err(FinanceError::InvalidInput(format!(
                "Unknown sort key '{}' (use date|amount|description)",
                other
            ))),
        }
    }
}

/// The active filter set shared by listings, charts and chart drill-down.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account: Option<String>,
    /// Matches the category and any `Category:Child` beneath it.
    pub category: Option<String>,
    /// Substring over description, payee and reference.
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub sort: SortKey,
    pub descending: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account: String,
    pub category: Option<String>,
}

pub fn query_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> FinanceResult<Vec<TransactionRow>> {
    let mut sql = format!(
        "SELECT {}, a.name, c.name FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN categories c ON t.category_id=c.id WHERE 1=1",
        TX_COLUMNS
    );
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(acct) = &filter.account {
        sql.push_str(" AND a.name=?");
        values.push(Box::new(acct.clone()));
    }
    if let Some(cat) = &filter.category {
        sql.push_str(" AND (c.name=? OR substr(c.name,1,length(?)+1)=?)");
        values.push(Box::new(cat.clone()));
        values.push(Box::new(cat.clone()));
        values.push(Box::new(format!("{}:", cat)));
    }
    if let Some(q) = &filter.search {
        sql.push_str(
            " AND (instr(t.description, ?) > 0 OR instr(IFNULL(t.payee,''), ?) > 0 OR instr(IFNULL(t.reference,''), ?) > 0)",
        );
        for _ in 0..3 {
            values.push(Box::new(q.clone()));
        }
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND t.date>=?");
        values.push(Box::new(from));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND t.date<=?");
        values.push(Box::new(to));
    }
    if let Some(tt) = filter.transaction_type {
        sql.push_str(" AND t.transaction_type=?");
        values.push(Box::new(tt.as_str()));
    }

    let dir = if filter.descending { "DESC" } else { "ASC" };
    let order = match filter.sort {
        SortKey::Date => format!(" ORDER BY t.date {dir}, t.id {dir}"),
        SortKey::Amount => format!(" ORDER BY CAST(t.amount AS REAL) {dir}, t.id {dir}"),
        SortKey::Description => format!(" ORDER BY t.description {dir}, t.id {dir}"),
    };
    sql.push_str(&order);
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        values.push(Box::new(limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |r| {
        Ok(TransactionRow {
            transaction: transaction_from_row(r, 0)?,
            account: r.get::<_, Option<String>>(10)?.unwrap_or_default(),
            category: r.get(11)?,
        })
    })?;
    let data = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    tracing::debug!(rows = data.len(), "queried transactions");
    Ok(data)
}
