// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Categorisation rule matching.
//!
//! Rules are evaluated by ascending `priority`, ties broken by ascending id
//! (creation order), whatever order the caller supplies them in. Matching is
//! case-sensitive on the stored text.

use crate::error::FinanceResult;
use crate::models::{CategorisationRule, MatchField, MatchType, Transaction};
use crate::store;
use rusqlite::Connection;

impl CategorisationRule {
    pub fn field_value<'a>(&self, t: &'a Transaction) -> Option<&'a str> {
        match self.match_field {
            MatchField::Description => Some(t.description.as_str()),
            MatchField::Payee => t.payee.as_deref(),
            MatchField::Reference => t.reference.as_deref(),
        }
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        let Some(value) = self.field_value(t) else {
            return false;
        };
        let needle = self.match_value.as_str();
        match self.match_type {
            MatchType::Contains => value.contains(needle),
            MatchType::StartsWith => value.starts_with(needle),
            MatchType::EndsWith => value.ends_with(needle),
            MatchType::Exact => value == needle,
        }
    }
}

/// Active rules in evaluation order.
pub fn evaluation_order(rules: &[CategorisationRule]) -> Vec<&CategorisationRule> {
    let mut active: Vec<&CategorisationRule> = rules.iter().filter(|r| r.is_active).collect();
    active.sort_by_key(|r| (r.priority, r.id));
    active
}

/// Category of the first matching active rule.
pub fn apply_rules(rules: &[CategorisationRule], t: &Transaction) -> Option<i64> {
    evaluation_order(rules)
        .into_iter()
        .find(|r| r.matches(t))
        .map(|r| r.category_id)
}

/// Categorises every uncategorised transaction a rule matches. Each update is
/// written on its own, so a failure part-way leaves earlier rows categorised.
pub fn apply_categorisation_rules(conn: &Connection) -> FinanceResult<usize> {
    let rules = store::fetch_rules(conn, true)?;
    if rules.is_empty() {
        return Ok(0);
    }
    let mut updated = 0;
    for t in store::uncategorised_transactions(conn)? {
        if let Some(category_id) = apply_rules(&rules, &t) {
            updated += store::set_transaction_category(conn, t.id, Some(category_id))?;
        }
    }
    tracing::info!(updated, "applied categorisation rules");
    Ok(updated)
}
