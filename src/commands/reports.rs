// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::Store;
use crate::period::{PeriodKind, PeriodRange, compute_range, shift_anchor};
use crate::report::{self, PeriodReport};
use crate::utils::{arg, fmt_money, fmt_percent, local_noon, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::Local;

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(store, sub)?,
        Some(("breakdown", sub)) => breakdown(store, sub)?,
        Some(("chart", sub)) => chart(store, sub)?,
        Some(("overview", sub)) => overview(store, sub)?,
        _ => {}
    }
    Ok(())
}

/// Window of `kind` around `anchor` (today when absent), moved by `shift` units.
pub fn resolve_range(kind: PeriodKind, anchor: Option<&String>, shift: i32) -> Result<PeriodRange> {
    let base = match anchor {
        Some(s) => local_noon(parse_date(s)?)?,
        None => Local::now(),
    };
    let anchor = shift_anchor(kind, &base, shift)?;
    Ok(compute_range(kind, &anchor))
}

fn range_from_args(sub: &clap::ArgMatches) -> Result<PeriodRange> {
    let kind: PeriodKind = arg(sub, "period")?.parse()?;
    let shift = sub.get_one::<i32>("shift").copied().unwrap_or(0);
    resolve_range(kind, sub.get_one::<String>("anchor"), shift)
}

pub fn build_report(store: &Store, sub: &clap::ArgMatches) -> Result<PeriodReport> {
    let range = range_from_args(sub)?;
    Ok(report::report_for_range(store, range)?)
}

fn heading(range: &PeriodRange) -> String {
    format!("{} summary: {} ({})", range.kind.heading(), range.label, range.range_label)
}

fn summary(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let (title, totals) = if sub.get_flag("all") {
        ("All time".to_string(), report::summary_for(store, None)?)
    } else {
        let range = range_from_args(sub)?;
        let totals = report::summary_for(store, Some(&range))?;
        (heading(&range), totals)
    };
    if !maybe_print_json(json_flag, jsonl_flag, &totals)? {
        println!("{}", title);
        println!(
            "{}",
            pretty_table(
                &["Income", "Expense", "Net"],
                vec![vec![
                    fmt_money(&totals.income),
                    fmt_money(&totals.expense),
                    fmt_money(&totals.net),
                ]],
            )
        );
    }
    Ok(())
}

fn breakdown(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_from_args(sub)?;
    let items = report::breakdown_for(store, &range)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
        println!("{}", heading(&range));
        let rows = items
            .iter()
            .map(|i| {
                vec![
                    i.name.clone(),
                    fmt_money(&i.total),
                    fmt_percent(i.share_percent),
                    i.color.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Spent", "Share", "Color"], rows)
        );
    }
    Ok(())
}

fn chart(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let report = build_report(store, sub)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    // JSON lines carry one chart segment each.
    let printed = if jsonl_flag {
        maybe_print_json(false, true, &report.segments)?
    } else {
        maybe_print_json(json_flag, false, &report)?
    };
    if printed {
        return Ok(());
    }

    println!("{}", heading(&report.range));
    println!(
        "Income {}  Expense {}  Net {}",
        fmt_money(&report.summary.income),
        fmt_money(&report.summary.expense),
        fmt_money(&report.summary.net)
    );
    let rows = report
        .segments
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                fmt_money(&s.total),
                fmt_percent(s.percent),
                s.color.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Category", "Spent", "Chart %", "Color"], rows)
    );
    Ok(())
}

fn overview(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let recent = sub
        .get_one::<usize>("recent")
        .copied()
        .unwrap_or(report::RECENT_LIMIT);
    let data = report::overview(store, recent)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!(
            "Balance {}  (income {}, expense {})",
            fmt_money(&data.summary.net),
            fmt_money(&data.summary.income),
            fmt_money(&data.summary.expense)
        );
        let rows = data
            .recent
            .iter()
            .map(|t| {
                let tx = &t.transaction;
                vec![
                    tx.occurred_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                    tx.title.clone(),
                    tx.r#type.to_string(),
                    fmt_money(&tx.amount),
                    t.category_name
                        .clone()
                        .unwrap_or_else(|| "(uncategorized)".into()),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["When", "Title", "Type", "Amount", "Category"], rows)
        );
    }
    Ok(())
}
