// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn today_arg(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("today")
            .long("today")
            .help("Reference day YYYY-MM-DD (defaults to the local date)"),
    )
}

/// The filter set shared by `tx list`, `chart` and `chart rows`.
fn filter_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("account").long("account"))
        .arg(
            Arg::new("category")
                .long("category")
                .help("Category name; a parent also matches its children"),
        )
        .arg(
            Arg::new("search")
                .long("search")
                .help("Substring of description, payee or reference"),
        )
        .arg(Arg::new("from").long("from").help("Start date YYYY-MM-DD"))
        .arg(Arg::new("to").long("to").help("End date YYYY-MM-DD"))
        .arg(
            Arg::new("type")
                .long("type")
                .value_parser(["income", "expense", "transfer"]),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .default_value("date")
                .value_parser(["date", "amount", "description"]),
        )
        .arg(Arg::new("desc").long("desc").action(ArgAction::SetTrue))
}

fn clear_flag(id: &'static str, long: &'static str, field: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .action(ArgAction::SetTrue)
        .conflicts_with(field)
}

fn ids_arg() -> Arg {
    Arg::new("ids")
        .long("ids")
        .required(true)
        .help("Comma separated transaction ids")
}

pub fn build_cli() -> Command {
    Command::new("familyfin")
        .version(clap::crate_version!())
        .about("Family finance: accounts, budgets, categorisation rules, CSV import and school fees")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("FAMILYFIN_DB")
                .help("SQLite database path"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More log output on stderr (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("config")
                .about("Persistent settings")
                .subcommand(Command::new("get").arg(Arg::new("key").long("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("bank")
                                .help("bank|card|cash|savings|loan"),
                        ),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories (use Parent:Child for sub-categories)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .value_parser(["income", "expense", "transfer"]),
                        ),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("tree"))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and edit transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .help("Non-negative magnitude"),
                        )
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .value_parser(["income", "expense", "transfer"]),
                        )
                        .arg(Arg::new("payee").long("payee"))
                        .arg(Arg::new("reference").long("reference"))
                        .arg(Arg::new("notes").long("notes"))
                        .arg(Arg::new("category").long("category")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense", "transfer"]),
                        )
                        .arg(Arg::new("payee").long("payee"))
                        .arg(Arg::new("reference").long("reference"))
                        .arg(Arg::new("notes").long("notes"))
                        .arg(Arg::new("category").long("category"))
                        .arg(clear_flag("clear_payee", "clear-payee", "payee"))
                        .arg(clear_flag("clear_reference", "clear-reference", "reference"))
                        .arg(clear_flag("clear_notes", "clear-notes", "notes"))
                        .arg(clear_flag("clear_category", "clear-category", "category")),
                )
                .subcommand(json_args(filter_args(
                    Command::new("list").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize)),
                    ),
                )))
                .subcommand(
                    Command::new("bulk-category")
                        .arg(ids_arg())
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("clear")
                                .long("clear")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("category"),
                        ),
                )
                .subcommand(
                    Command::new("bulk-payee")
                        .arg(ids_arg())
                        .arg(Arg::new("payee").long("payee").required(true)),
                )
                .subcommand(
                    Command::new("bulk-description")
                        .arg(ids_arg())
                        .arg(Arg::new("description").long("description").required(true)),
                )
                .subcommand(Command::new("bulk-delete").arg(ids_arg())),
        )
        .subcommand(
            Command::new("budget")
                .about("Budgets, progress and alerts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Omit to cover every expense"),
                        )
                        .arg(
                            Arg::new("period")
                                .long("period")
                                .default_value("monthly")
                                .value_parser(["weekly", "fortnightly", "monthly", "quarterly", "yearly"]),
                        )
                        .arg(Arg::new("alert_threshold").long("alert-threshold")),
                )
                .subcommand(json_args(
                    Command::new("list").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include deactivated budgets"),
                    ),
                ))
                .subcommand(json_args(today_arg(
                    Command::new("progress").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )))
                .subcommand(json_args(today_arg(Command::new("summary"))))
                .subcommand(today_arg(Command::new("alerts")))
                .subcommand(
                    Command::new("deactivate").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("rules")
                .about("Categorisation rules")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("field")
                                .long("field")
                                .default_value("description")
                                .value_parser(["description", "payee", "reference"]),
                        )
                        .arg(
                            Arg::new("match_type")
                                .long("match-type")
                                .default_value("contains")
                                .value_parser(["contains", "starts_with", "ends_with", "exact"]),
                        )
                        .arg(Arg::new("value").long("value").required(true))
                        .arg(
                            Arg::new("priority")
                                .long("priority")
                                .default_value("0")
                                .value_parser(value_parser!(i64)),
                        ),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true)))
                .subcommand(Command::new("toggle").arg(Arg::new("id").long("id").required(true)))
                .subcommand(Command::new("apply").about("Categorise uncategorised transactions"))
                .subcommand(
                    Command::new("test")
                        .about("Show which category a transaction would get")
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(Arg::new("payee").long("payee"))
                        .arg(Arg::new("reference").long("reference")),
                ),
        )
        .subcommand(
            Command::new("import").about("Import data").subcommand(
                Command::new("csv")
                    .about("Import a bank CSV export")
                    .arg(Arg::new("path").long("path").required(true))
                    .arg(Arg::new("account").long("account").required(true))
                    .arg(
                        Arg::new("dry_run")
                            .long("dry-run")
                            .action(ArgAction::SetTrue)
                            .help("Parse and print without saving"),
                    ),
            ),
        )
        .subcommand(
            Command::new("chart")
                .about("Grouped spending totals")
                .subcommand(json_args(filter_args(Command::new("category"))))
                .subcommand(json_args(filter_args(Command::new("payee"))))
                .subcommand(json_args(filter_args(
                    Command::new("rows")
                        .about("Transactions behind one chart entry")
                        .arg(
                            Arg::new("group_by")
                                .long("group-by")
                                .required(true)
                                .value_parser(["category", "payee"]),
                        )
                        .arg(Arg::new("key").long("key").required(true)),
                ))),
        )
        .subcommand(
            Command::new("notify")
                .about("Budget alert notifications")
                .subcommand(json_args(
                    Command::new("list").arg(
                        Arg::new("unread")
                            .long("unread")
                            .action(ArgAction::SetTrue),
                    ),
                ))
                .subcommand(
                    Command::new("read")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("id"),
                        ),
                ),
        )
        .subcommand(
            Command::new("family")
                .about("Family members, school fees and activities")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("relationship")
                                .long("relationship")
                                .default_value("child"),
                        )
                        .arg(
                            Arg::new("birth_year")
                                .long("birth-year")
                                .value_parser(value_parser!(i32)),
                        ),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
                .subcommand(
                    Command::new("fee-add")
                        .arg(Arg::new("member").long("member").required(true))
                        .arg(Arg::new("school").long("school").required(true))
                        .arg(Arg::new("term").long("term").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("due").long("due").required(true)),
                )
                .subcommand(json_args(
                    Command::new("fees")
                        .arg(Arg::new("member").long("member"))
                        .arg(
                            Arg::new("unpaid")
                                .long("unpaid")
                                .action(ArgAction::SetTrue),
                        ),
                ))
                .subcommand(today_arg(
                    Command::new("fee-paid")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("on").long("on").help("Payment date YYYY-MM-DD")),
                ))
                .subcommand(
                    Command::new("activity-add")
                        .arg(Arg::new("member").long("member").required(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("provider").long("provider"))
                        .arg(Arg::new("cost").long("cost").required(true))
                        .arg(
                            Arg::new("frequency")
                                .long("frequency")
                                .default_value("monthly")
                                .value_parser(["weekly", "fortnightly", "monthly", "quarterly", "yearly"]),
                        )
                        .arg(Arg::new("start").long("start").required(true))
                        .arg(Arg::new("end").long("end")),
                )
                .subcommand(json_args(
                    Command::new("activities").arg(Arg::new("member").long("member")),
                ))
                .subcommand(json_args(today_arg(Command::new("costs")))),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv or json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
}
