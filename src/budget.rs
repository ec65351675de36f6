// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget progress, portfolio summary and alert emission.

use crate::error::FinanceResult;
use crate::models::{Budget, Transaction, TransactionType};
use crate::period::{calculate_period_dates, PeriodDates};
use crate::store;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub period: PeriodDates,
    pub spent: Decimal,
    /// Floored at zero; see `variance` for the signed figure.
    pub remaining: Decimal,
    /// `amount - spent`, negative once over budget.
    pub variance: Decimal,
    pub percentage: Decimal,
    pub is_over_budget: bool,
    pub is_approaching_limit: bool,
    pub days_remaining: i64,
    pub daily_allowance: Decimal,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetSummary {
    pub total_budgeted: Decimal,
    pub total_spent: Decimal,
    pub total_remaining: Decimal,
    pub over_budget_count: usize,
    pub approaching_limit_count: usize,
    pub budgets: Vec<BudgetProgress>,
}

/// Sums money without panicking; clamps at `Decimal::MAX`.
pub fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, |acc, a| {
        acc.checked_add(a).unwrap_or(Decimal::MAX)
    })
}

fn applies_to(budget: &Budget, t: &Transaction) -> bool {
    t.transaction_type == TransactionType::Expense
        && budget
            .category_id
            .is_none_or(|cid| t.category_id == Some(cid))
}

/// Pure progress computation. Rows outside the budget's current window, of
/// another category, or not expenses are ignored.
pub fn compute_progress(budget: &Budget, transactions: &[Transaction], now: NaiveDate) -> BudgetProgress {
    let period = calculate_period_dates(budget.period, now);
    let in_period: Vec<Transaction> = transactions
        .iter()
        .filter(|t| period.contains(t.date) && applies_to(budget, t))
        .cloned()
        .collect();

    let spent = saturating_sum(in_period.iter().map(|t| t.amount.abs()));
    let variance = budget.amount.checked_sub(spent).unwrap_or(Decimal::MIN);
    let remaining = variance.max(Decimal::ZERO);
    let percentage = if budget.amount.is_zero() {
        Decimal::ZERO
    } else {
        spent
            .checked_div(budget.amount)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
    };
    // a fully spent budget counts as over; nothing spent against zero does not
    let is_over_budget =
        spent > budget.amount || (!budget.amount.is_zero() && spent == budget.amount);
    let is_approaching_limit =
        percentage >= budget.alert_threshold && percentage < Decimal::ONE_HUNDRED;
    let daily_allowance = if period.days_remaining > 0 {
        remaining / Decimal::from(period.days_remaining)
    } else {
        Decimal::ZERO
    };

    BudgetProgress {
        budget: budget.clone(),
        period,
        spent,
        remaining,
        variance,
        percentage,
        is_over_budget,
        is_approaching_limit,
        days_remaining: period.days_remaining,
        daily_allowance,
        transactions: in_period,
    }
}

/// `Ok(None)` when the budget does not exist.
pub fn budget_progress(
    conn: &Connection,
    budget_id: i64,
    now: NaiveDate,
) -> FinanceResult<Option<BudgetProgress>> {
    let Some(budget) = store::fetch_budget(conn, budget_id)? else {
        tracing::debug!(budget_id, "budget not found");
        return Ok(None);
    };
    Ok(Some(progress_for(conn, &budget, now)?))
}

fn progress_for(conn: &Connection, budget: &Budget, now: NaiveDate) -> FinanceResult<BudgetProgress> {
    let window = calculate_period_dates(budget.period, now);
    let rows = store::expenses_between(conn, budget.category_id, window.start_date, window.end_date)?;
    Ok(compute_progress(budget, &rows, now))
}

/// Reduces independent per-budget progress into portfolio totals.
pub fn summarize(progress: Vec<BudgetProgress>) -> BudgetSummary {
    let total_budgeted = saturating_sum(progress.iter().map(|p| p.budget.amount));
    let total_spent = saturating_sum(progress.iter().map(|p| p.spent));
    BudgetSummary {
        total_budgeted,
        total_spent,
        total_remaining: total_budgeted
            .checked_sub(total_spent)
            .unwrap_or(Decimal::MIN)
            .max(Decimal::ZERO),
        over_budget_count: progress.iter().filter(|p| p.is_over_budget).count(),
        approaching_limit_count: progress.iter().filter(|p| p.is_approaching_limit).count(),
        budgets: progress,
    }
}

/// Progress for every active budget, then `summarize`. A budget whose progress
/// cannot be computed is skipped rather than failing the whole summary.
pub fn budget_summary(conn: &Connection, now: NaiveDate) -> FinanceResult<BudgetSummary> {
    let budgets = store::fetch_budgets(conn, true)?;
    let progress: Vec<BudgetProgress> = budgets
        .iter()
        .filter_map(|b| match progress_for(conn, b, now) {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(budget_id = b.id, error = %err, "skipping budget progress");
                None
            }
        })
        .collect();
    Ok(summarize(progress))
}

pub fn alert_message(p: &BudgetProgress) -> Option<(&'static str, String)> {
    if p.is_over_budget {
        Some((
            "over_budget",
            format!(
                "Budget '{}' is over by {:.2} ({:.0}% used)",
                p.budget.name,
                -p.variance,
                p.percentage
            ),
        ))
    } else if p.is_approaching_limit {
        Some((
            "approaching_limit",
            format!(
                "Budget '{}' has used {:.0}% ({:.2} remaining)",
                p.budget.name, p.percentage, p.remaining
            ),
        ))
    } else {
        None
    }
}

/// Writes at most one notification per budget per day; returns how many were
/// newly written.
pub fn check_budget_alerts(conn: &Connection, now: NaiveDate) -> FinanceResult<usize> {
    let summary = budget_summary(conn, now)?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO notifications(budget_id, day, kind, message) VALUES (?1,?2,?3,?4)",
    )?;
    let mut emitted = 0;
    for p in &summary.budgets {
        if let Some((kind, message)) = alert_message(p) {
            let n = stmt.execute(params![p.budget.id, now, kind, message])?;
            if n > 0 {
                tracing::info!(budget_id = p.budget.id, kind, "budget alert emitted");
            }
            emitted += n;
        }
    }
    Ok(emitted)
}
