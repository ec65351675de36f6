// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::FinanceError;
use crate::utils::{pretty_table, req_arg};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req_arg(sub, "name")?;
            let typ = req_arg(sub, "type")?.to_lowercase();
            conn.execute(
                "INSERT INTO accounts(name, type) VALUES (?1, ?2)",
                params![name, typ],
            )?;
            println!("Added account '{}' ({})", name, typ);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT a.name, a.type, COUNT(t.id), a.created_at
                 FROM accounts a LEFT JOIN transactions t ON t.account_id=a.id
                 GROUP BY a.id ORDER BY a.name",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, String>(3)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, t, c, cr) = row?;
                data.push(vec![n, t, c.to_string(), cr]);
            }
            println!(
                "{}",
                pretty_table(&["Name", "Type", "Transactions", "Created"], data)
            );
        }
        Some(("rm", sub)) => {
            let name = req_arg(sub, "name")?;
            let n = conn.execute("DELETE FROM accounts WHERE name=?1", params![name])?;
            if n == 0 {
                return Err(FinanceError::NotFound(format!("Account '{}'", name)).into());
            }
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
