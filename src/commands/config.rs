// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_setting, parse_decimal, req_arg, set_setting, SETTING_ALERT_THRESHOLD};
use anyhow::{anyhow, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = req_arg(sub, "key")?;
            match get_setting(conn, &key)? {
                Some(v) => println!("{} = {}", key, v),
                None => println!("{} is not set", key),
            }
        }
        Some(("set", sub)) => {
            let key = req_arg(sub, "key")?;
            let value = req_arg(sub, "value")?;
            if key == SETTING_ALERT_THRESHOLD {
                let t = parse_decimal(&value)?;
                if t.is_sign_negative() || t > rust_decimal::Decimal::ONE_HUNDRED {
                    return Err(anyhow!("Alert threshold must be between 0 and 100"));
                }
            }
            set_setting(conn, &key, &value)?;
            tracing::info!(%key, "setting updated");
            println!("{} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
