// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget period windows.
//!
//! Every calculation takes the reference day explicitly; nothing in here reads
//! the system clock.

use crate::models::BudgetPeriod;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_remaining: i64,
}

impl PeriodDates {
    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

pub fn calculate_period_dates(period: BudgetPeriod, now: NaiveDate) -> PeriodDates {
    let (start_date, end_date) = match period {
        BudgetPeriod::Weekly => {
            let start = now - Duration::days(i64::from(now.weekday().num_days_from_monday()));
            (start, start + Duration::days(6))
        }
        BudgetPeriod::Fortnightly => {
            // Fortnights are counted from 1 January, not from a user-chosen anchor.
            let jan1 = first_of_month(now.year(), 1);
            let weeks = (now - jan1).num_days() / 7;
            let start = jan1 + Duration::days((weeks / 2) * 14);
            (start, start + Duration::days(13))
        }
        BudgetPeriod::Monthly => {
            let start = first_of_month(now.year(), now.month());
            let end = first_of_month(now.year(), now.month() + 1) - Duration::days(1);
            (start, end)
        }
        BudgetPeriod::Quarterly => {
            let first_month = (now.month0() / 3) * 3 + 1;
            let start = first_of_month(now.year(), first_month);
            let end = first_of_month(now.year(), first_month + 3) - Duration::days(1);
            (start, end)
        }
        BudgetPeriod::Yearly => {
            let fy = financial_year_start(now);
            let start = first_of_month(fy, 7);
            let end = first_of_month(fy + 1, 7) - Duration::days(1);
            (start, end)
        }
    };

    PeriodDates {
        start_date,
        end_date,
        days_remaining: (end_date - now).num_days().max(0),
    }
}

/// Calendar year in which the Australian financial year containing `date` starts.
pub fn financial_year_start(date: NaiveDate) -> i32 {
    if date.month() >= 7 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// `FY2024-25` style label.
pub fn financial_year_label(date: NaiveDate) -> String {
    let fy = financial_year_start(date);
    format!("FY{}-{:02}", fy, (fy + 1).rem_euclid(100))
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    let (year, month) = if month > 12 {
        (year + 1, month - 12)
    } else {
        (year, month)
    };
    // month is within 1..=12 here and day 1 always exists
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}
