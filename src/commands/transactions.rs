// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::categories::find_by_name;
use crate::commands::reports::resolve_range;
use crate::db::{DEFAULT_LIST_LIMIT, Store};
use crate::models::{
    Category, NewTransaction, TransactionFilters, TransactionType, TransactionUpdate,
    TransactionWithCategory,
};
use crate::period::PeriodKind;
use crate::utils::{arg, fmt_money, maybe_print_json, parse_decimal, parse_when, pretty_table};
use anyhow::{Result, bail};
use chrono::{Local, Utc};
use serde::Serialize;

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            add(store, sub)?;
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => remove(store, sub)?,
        Some(("reset", sub)) => reset(store, sub)?,
        _ => {}
    }
    Ok(())
}

/// Resolve `--category` and make sure it matches the transaction type.
fn category_for(store: &Store, name: &str, kind: TransactionType) -> Result<Category> {
    let cat = find_by_name(store, name)?;
    if cat.r#type != kind {
        bail!(
            "Category '{}' is for {} transactions, not {}",
            cat.name,
            cat.r#type,
            kind
        );
    }
    Ok(cat)
}

pub fn add(store: &Store, sub: &clap::ArgMatches) -> Result<i64> {
    let amount = parse_decimal(arg(sub, "amount")?)?;
    let kind: TransactionType = arg(sub, "type")?.parse()?;
    let category = match sub.get_one::<String>("category") {
        Some(name) => Some(category_for(store, name, kind)?),
        None => None,
    };

    // Untitled entries are named after their category, or their type.
    let title = match sub.get_one::<String>("title").map(|s| s.trim()) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => category
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| kind.label().to_string()),
    };
    let occurred_at = match sub.get_one::<String>("at") {
        Some(s) => parse_when(s)?,
        None => Utc::now(),
    };

    let input = NewTransaction {
        title,
        amount,
        r#type: kind,
        category_id: category.as_ref().map(|c| c.id),
        note: sub
            .get_one::<String>("note")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        occurred_at,
    };
    let id = store.add_transaction(&input)?;
    println!(
        "Recorded {} {} '{}' on {} (id {})",
        kind,
        fmt_money(&amount),
        input.title,
        occurred_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        id
    );
    Ok(id)
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub occurred_at: String,
    pub title: String,
    pub r#type: String,
    pub amount: String,
    pub category: String,
    pub note: String,
}

impl From<&TransactionWithCategory> for TransactionRow {
    fn from(t: &TransactionWithCategory) -> Self {
        let tx = &t.transaction;
        Self {
            id: tx.id,
            occurred_at: tx
                .occurred_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            title: tx.title.clone(),
            r#type: tx.r#type.to_string(),
            amount: fmt_money(&tx.amount),
            category: t
                .category_name
                .clone()
                .unwrap_or_else(|| "(uncategorized)".into()),
            note: tx.note.clone().unwrap_or_default(),
        }
    }
}

pub fn query_rows(store: &Store, sub: &clap::ArgMatches) -> Result<Vec<TransactionWithCategory>> {
    let mut filters = TransactionFilters {
        limit: Some(
            sub.get_one::<usize>("limit")
                .copied()
                .unwrap_or(DEFAULT_LIST_LIMIT),
        ),
        offset: sub.get_one::<usize>("offset").copied().unwrap_or(0),
        ..TransactionFilters::default()
    };
    if let Some(t) = sub.get_one::<String>("type") {
        filters.r#type = Some(t.parse()?);
    }
    if let Some(name) = sub.get_one::<String>("category") {
        filters.category_id = Some(find_by_name(store, name)?.id);
    }
    if let Some(p) = sub.get_one::<String>("period") {
        let kind: PeriodKind = p.parse()?;
        let range = resolve_range(kind, sub.get_one::<String>("anchor"), 0)?;
        filters.start = Some(range.start);
        filters.end = Some(range.end);
    }
    Ok(store.list_transactions_with_category(&filters)?)
}

fn list(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(store, sub)?;
    let rows: Vec<TransactionRow> = data.iter().map(TransactionRow::from).collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let table = rows
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.occurred_at,
                    r.title,
                    r.r#type,
                    r.amount,
                    r.category,
                    r.note,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "When", "Title", "Type", "Amount", "Category", "Note"],
                table,
            )
        );
    }
    Ok(())
}

fn edit(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub
        .get_one::<i64>("id")
        .ok_or_else(|| anyhow::anyhow!("Missing required argument --id"))?;
    let Some(existing) = store.get_transaction(id)? else {
        bail!("Transaction {} not found", id);
    };

    let kind = match sub.get_one::<String>("type") {
        Some(t) => Some(t.parse::<TransactionType>()?),
        None => None,
    };
    let category_id = if sub.get_flag("clear-category") {
        Some(None)
    } else {
        match sub.get_one::<String>("category") {
            Some(name) => Some(Some(category_for(
                store,
                name,
                kind.unwrap_or(existing.r#type),
            )?
            .id)),
            None => None,
        }
    };
    if let (Some(kind), None, Some(current)) = (kind, category_id, existing.category_id) {
        if let Some(cat) = store.get_category(current)? {
            if cat.r#type != kind {
                bail!(
                    "Transaction {} is filed under '{}'; pass --category or --clear-category to change its type",
                    id,
                    cat.name
                );
            }
        }
    }
    let update = TransactionUpdate {
        title: sub.get_one::<String>("title").map(|s| s.trim().to_string()),
        amount: match sub.get_one::<String>("amount") {
            Some(a) => Some(parse_decimal(a)?),
            None => None,
        },
        r#type: kind,
        category_id,
        note: if sub.get_flag("clear-note") {
            Some(None)
        } else {
            sub.get_one::<String>("note").map(|s| Some(s.trim().to_string()))
        },
        occurred_at: match sub.get_one::<String>("at") {
            Some(s) => Some(parse_when(s)?),
            None => None,
        },
    };
    if update.is_empty() {
        bail!("Nothing to change for transaction {}", id);
    }
    store.update_transaction(id, &update)?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn remove(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub
        .get_one::<i64>("id")
        .ok_or_else(|| anyhow::anyhow!("Missing required argument --id"))?;
    store.delete_transaction(id)?;
    println!("Removed transaction {}", id);
    Ok(())
}

fn reset(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    if !sub.get_flag("yes") {
        bail!("Refusing to delete every transaction without --yes");
    }
    let removed = store.delete_all_transactions()?;
    println!("Removed {} transactions", removed);
    Ok(())
}
