// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

/// Largest `--shift` accepted, in periods.
pub const MAX_SHIFT: i64 = 10_000;

fn period_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("period")
            .long("period")
            .short('p')
            .default_value("month")
            .help("week, month or year"),
    )
    .arg(
        Arg::new("anchor")
            .long("anchor")
            .help("Any date inside the period (YYYY-MM-DD); defaults to today"),
    )
    .arg(
        Arg::new("shift")
            .long("shift")
            .value_parser(value_parser!(i32).range(-MAX_SHIFT..=MAX_SHIFT))
            .allow_negative_numbers(true)
            .default_value("0")
            .help("Move the period back (negative) or forward by N units"),
    )
}

fn type_arg(default: Option<&'static str>) -> Arg {
    let a = Arg::new("type")
        .long("type")
        .short('t')
        .value_parser(["income", "expense"]);
    match default {
        Some(d) => a.default_value(d),
        None => a,
    }
}

pub fn build_cli() -> Command {
    Command::new("cateten")
        .about("Track income and expenses and see where the money goes")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf))
                .help("Database file (overrides CATETEN_DB)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(Command::new("init").about("Create the database and default categories"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(type_arg(Some("expense")))
                        .arg(Arg::new("icon").long("icon"))
                        .arg(Arg::new("color").long("color").help("Hex color, e.g. #2563EB")),
                )
                .subcommand(json_args(
                    Command::new("list").arg(type_arg(None)),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("rename").long("rename"))
                        .arg(Arg::new("icon").long("icon").conflicts_with("clear-icon"))
                        .arg(
                            Arg::new("clear-icon")
                                .long("clear-icon")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(Arg::new("color").long("color").conflicts_with("clear-color"))
                        .arg(
                            Arg::new("clear-color")
                                .long("clear-color")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and browse transactions")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(type_arg(Some("expense")))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("title").long("title"))
                        .arg(Arg::new("note").long("note"))
                        .arg(
                            Arg::new("at")
                                .long("at")
                                .help("RFC 3339 time or YYYY-MM-DD; defaults to now"),
                        ),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(type_arg(None))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("period")
                                .long("period")
                                .help("Restrict to the week, month or year around --anchor"),
                        )
                        .arg(Arg::new("anchor").long("anchor").requires("period"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(
                            Arg::new("offset")
                                .long("offset")
                                .value_parser(value_parser!(usize))
                                .default_value("0"),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("title").long("title"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(type_arg(None))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .conflicts_with("clear-category"),
                        )
                        .arg(
                            Arg::new("clear-category")
                                .long("clear-category")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(Arg::new("note").long("note").conflicts_with("clear-note"))
                        .arg(
                            Arg::new("clear-note")
                                .long("clear-note")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(Arg::new("at").long("at")),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("reset")
                        .about("Delete every transaction")
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .action(ArgAction::SetTrue)
                                .help("Confirm deleting all transactions"),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Period summaries and spending breakdowns")
                .subcommand_required(true)
                .subcommand(json_args(period_args(
                    Command::new("summary").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Totals over every transaction"),
                    ),
                )))
                .subcommand(json_args(period_args(Command::new("breakdown"))))
                .subcommand(json_args(period_args(Command::new("chart"))))
                .subcommand(json_args(
                    Command::new("overview").arg(
                        Arg::new("recent")
                            .long("recent")
                            .value_parser(value_parser!(usize))
                            .default_value("8"),
                    ),
                )),
        )
}
