// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Notification;
use crate::utils::{json_flags, maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = list_notifications(conn, sub.get_flag("unread"))?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|n| {
                        vec![
                            n.id.to_string(),
                            n.day.to_string(),
                            n.kind.clone(),
                            n.message.clone(),
                            if n.is_read { "" } else { "●" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Day", "Kind", "Message", "New"], rows)
                );
            }
        }
        Some(("read", sub)) => {
            let n = if sub.get_flag("all") {
                conn.execute("UPDATE notifications SET is_read=1 WHERE is_read=0", [])?
            } else if let Some(id) = sub.get_one::<i64>("id") {
                conn.execute("UPDATE notifications SET is_read=1 WHERE id=?1", params![id])?
            } else {
                return Err(anyhow!("Pass --id N or --all"));
            };
            println!("Marked {} notification(s) read", n);
        }
        _ => {}
    }
    Ok(())
}

pub fn list_notifications(conn: &Connection, unread_only: bool) -> Result<Vec<Notification>> {
    let sql = if unread_only {
        "SELECT id, budget_id, day, kind, message, is_read FROM notifications WHERE is_read=0 ORDER BY day DESC, id DESC"
    } else {
        "SELECT id, budget_id, day, kind, message, is_read FROM notifications ORDER BY day DESC, id DESC"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |r| {
        Ok(Notification {
            id: r.get(0)?,
            budget_id: r.get(1)?,
            day: r.get(2)?,
            kind: r.get(3)?,
            message: r.get(4)?,
            is_read: r.get(5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
