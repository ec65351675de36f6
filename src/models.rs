// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::FinanceError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Implements `Display`/`FromStr` over the lowercase strings stored in SQLite.
macro_rules! text_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FinanceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(FinanceError::InvalidInput(format!(
                        "Unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

text_enum!(TransactionType, "transaction type", {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
    Transfer,
}

text_enum!(CategoryType, "category type", {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Description,
    Payee,
    Reference,
}

text_enum!(MatchField, "match field", {
    Description => "description",
    Payee => "payee",
    Reference => "reference",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Contains,
    StartsWith,
    EndsWith,
    Exact,
}

text_enum!(MatchType, "match type", {
    Contains => "contains",
    StartsWith => "starts_with",
    EndsWith => "ends_with",
    Exact => "exact",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
    Yearly,
}

text_enum!(BudgetPeriod, "budget period", {
    Weekly => "weekly",
    Fortnightly => "fortnightly",
    Monthly => "monthly",
    Quarterly => "quarterly",
    Yearly => "yearly",
});

impl BudgetPeriod {
    /// Stored rows with an unrecognised period fall back to monthly.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(BudgetPeriod::Monthly)
    }

    /// How many times the period recurs in a year.
    pub fn per_year(&self) -> Decimal {
        match self {
            BudgetPeriod::Weekly => Decimal::from(52),
            BudgetPeriod::Fortnightly => Decimal::from(26),
            BudgetPeriod::Monthly => Decimal::from(12),
            BudgetPeriod::Quarterly => Decimal::from(4),
            BudgetPeriod::Yearly => Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: CategoryType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    /// Always a non-negative magnitude; direction comes from `transaction_type`.
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub payee: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Transaction {
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
            TransactionType::Transfer => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorisationRule {
    pub id: i64,
    pub category_id: i64,
    pub match_field: MatchField,
    pub match_type: MatchType,
    pub match_value: String,
    pub is_active: bool,
    pub priority: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    /// `None` applies the budget to every expense.
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub alert_threshold: Decimal,
    pub is_active: bool,
}

pub const DEFAULT_ALERT_THRESHOLD: i64 = 80;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: i64,
    pub name: String,
    pub relationship: String,
    pub birth_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolFee {
    pub id: i64,
    pub member_id: i64,
    pub school: String,
    pub term: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub member_id: i64,
    pub name: String,
    pub provider: Option<String>,
    pub cost: Decimal,
    pub frequency: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub budget_id: i64,
    pub day: NaiveDate,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
}
