// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::Store;
use crate::models::{Category, CategoryUpdate, NewCategory, TransactionType};
use crate::utils::{arg, maybe_print_json, pretty_table};
use anyhow::{Context, Result, bail};

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => remove(store, sub)?,
        _ => {}
    }
    Ok(())
}

pub(crate) fn find_by_name(store: &Store, name: &str) -> Result<Category> {
    store
        .category_by_name(name)?
        .with_context(|| format!("Category '{}' not found", name.trim()))
}

fn add(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let name = arg(sub, "name")?.trim().to_string();
    let kind: TransactionType = arg(sub, "type")?.parse()?;
    let input = NewCategory {
        name,
        r#type: kind,
        icon: sub.get_one::<String>("icon").map(|s| s.trim().to_string()),
        color: sub.get_one::<String>("color").map(|s| s.trim().to_string()),
    };
    store
        .add_category(&input)
        .with_context(|| format!("Could not add category '{}'", input.name))?;
    println!("Added {} category '{}'", kind, input.name);
    Ok(())
}

fn list(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let kind = match sub.get_one::<String>("type") {
        Some(t) => Some(t.parse::<TransactionType>()?),
        None => None,
    };
    let data = store.list_categories(kind)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    c.r#type.to_string(),
                    c.icon.clone().unwrap_or_default(),
                    c.color.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Type", "Icon", "Color"], rows)
        );
    }
    Ok(())
}

fn edit(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let current = find_by_name(store, arg(sub, "name")?)?;
    let update = CategoryUpdate {
        name: sub.get_one::<String>("rename").map(|s| s.trim().to_string()),
        icon: if sub.get_flag("clear-icon") {
            Some(None)
        } else {
            sub.get_one::<String>("icon").map(|s| Some(s.trim().to_string()))
        },
        color: if sub.get_flag("clear-color") {
            Some(None)
        } else {
            sub.get_one::<String>("color").map(|s| Some(s.trim().to_string()))
        },
    };
    if update.is_empty() {
        bail!("Nothing to change for category '{}'", current.name);
    }
    store.update_category(current.id, &update)?;
    println!("Updated category '{}'", current.name);
    Ok(())
}

fn remove(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let current = find_by_name(store, arg(sub, "name")?)?;
    store.delete_category(current.id)?;
    println!(
        "Removed category '{}'; its transactions are now uncategorized",
        current.name
    );
    Ok(())
}
