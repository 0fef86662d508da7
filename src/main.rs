// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cateten::config::Config;
use cateten::db::Store;
use cateten::{cli, commands};

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "cateten=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    init_tracing(matches.get_flag("verbose"));

    let config = Config::resolve(matches.get_one::<PathBuf>("db").map(PathBuf::as_path))?;
    let store = Store::open(&config.db_path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!(
                "Database initialized at {} (schema v{})",
                config.db_path.display(),
                store.schema_version()?
            );
        }
        Some(("category", sub)) => commands::categories::handle(&store, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&store, sub)?,
        Some(("report", sub)) => commands::reports::handle(&store, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    store.close()?;
    Ok(())
}
