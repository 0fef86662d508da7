// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Cateten", "cateten"));

/// Overrides the database location when `--db` is not given.
pub const DB_ENV: &str = "CATETEN_DB";
pub const DB_FILE: &str = "cateten.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolution order: explicit path, then `CATETEN_DB`, then the platform data dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(DB_ENV).filter(|v| !v.is_empty());
        Self::resolve_with(explicit, env.as_deref().map(Path::new))
    }

    pub fn resolve_with(explicit: Option<&Path>, env: Option<&Path>) -> Result<Self> {
        let db_path = match explicit.or(env) {
            Some(p) => p.to_path_buf(),
            None => default_db_path()?,
        };
        Ok(Self { db_path })
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join(DB_FILE))
}
