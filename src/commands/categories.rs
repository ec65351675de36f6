// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::chart::{category_tree, CategoryPath};
use crate::error::FinanceError;
use crate::models::CategoryType;
use crate::store::fetch_categories;
use crate::utils::{pretty_table, req_arg};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req_arg(sub, "name")?;
            let kind: CategoryType = req_arg(sub, "type")?.parse()?;
            let path = CategoryPath::parse(&name);
            if path.parent.is_empty() || path.child.as_deref() == Some("") {
                return Err(anyhow!("Invalid category name '{}'", name));
            }
            conn.execute(
                "INSERT INTO categories(name, category_type) VALUES (?1, ?2)",
                params![name, kind.as_str()],
            )?;
            println!("Added category '{}' ({})", name, kind);
        }
        Some(("list", _)) => {
            let data = fetch_categories(conn)?
                .into_iter()
                .map(|c| vec![c.name, c.category_type.to_string()])
                .collect();
            println!("{}", pretty_table(&["Category", "Type"], data));
        }
        Some(("tree", _)) => {
            let cats = fetch_categories(conn)?;
            let mut data = Vec::new();
            for (parent, children) in category_tree(&cats) {
                data.push(vec![parent, String::new()]);
                for c in children {
                    let child = CategoryPath::parse(&c.name).child.unwrap_or_default();
                    data.push(vec![String::new(), child]);
                }
            }
            println!("{}", pretty_table(&["Category", "Sub-category"], data));
        }
        Some(("rm", sub)) => {
            let name = req_arg(sub, "name")?;
            let n = conn.execute("DELETE FROM categories WHERE name=?1", params![name])?;
            if n == 0 {
                return Err(FinanceError::NotFound(format!("Category '{}'", name)).into());
            }
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
