// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite-backed storage for categories and transactions.
//!
//! A [`Store`] is opened once, passed by reference to whatever needs it and
//! closed explicitly. Every mutation bumps the store revision and notifies
//! subscribers so cached reports can be dropped.

use std::fs;
use std::path::{Path, PathBuf};
use std::cell::{Cell, RefCell};
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::parse_timestamp;

mod categories;
mod transactions;

pub use transactions::DEFAULT_LIST_LIMIT;

pub const SCHEMA_VERSION: i64 = 1;

/// SQL expression producing the current instant in stored timestamp form.
pub(crate) const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ','now')";

/// Which derived views a mutation made stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewScope {
    Categories,
    Transactions,
    /// Category edits change names and colors shown in breakdowns too.
    All,
}

impl ViewScope {
    pub fn affects_transactions(&self) -> bool {
        matches!(self, ViewScope::Transactions | ViewScope::All)
    }

    pub fn affects_categories(&self) -> bool {
        matches!(self, ViewScope::Categories | ViewScope::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub revision: u64,
    pub scope: ViewScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
}

pub struct Store {
    conn: Connection,
    location: Location,
    revision: Cell<u64>,
    listeners: RefCell<Vec<Sender<Invalidation>>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let location = Location::File(path.to_path_buf());
        let conn = connect(&location)?;
        info!(path = %path.display(), "opened store");
        Ok(Self::with_connection(conn, location))
    }

    pub fn open_in_memory() -> Result<Self> {
        let location = Location::Memory;
        let conn = connect(&location)?;
        Ok(Self::with_connection(conn, location))
    }

    fn with_connection(conn: Connection, location: Location) -> Self {
        Self {
            conn,
            location,
            revision: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(p) => Some(p),
            Location::Memory => None,
        }
    }

    pub fn close(self) -> Result<()> {
        let Store { conn, .. } = self;
        conn.close().map_err(|(_, e)| Error::Database(e))?;
        debug!("closed store");
        Ok(())
    }

    /// Close the current connection and open a fresh one at the same location.
    /// An in-memory store comes back empty apart from the default categories.
    pub fn reset(&mut self) -> Result<()> {
        let fresh = connect(&self.location)?;
        let old = std::mem::replace(&mut self.conn, fresh);
        old.close().map_err(|(_, e)| Error::Database(e))?;
        info!("store connection reset");
        self.notify(ViewScope::All);
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i64> {
        schema_version(&self.conn)
    }

    /// Number of mutations applied through this handle.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Receive an [`Invalidation`] for every subsequent mutation.
    pub fn subscribe(&self) -> Receiver<Invalidation> {
        let (tx, rx) = mpsc::channel();
        self.listeners.borrow_mut().push(tx);
        rx
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn notify(&self, scope: ViewScope) {
        let revision = self.revision.get() + 1;
        self.revision.set(revision);
        let event = Invalidation { revision, scope };
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|tx| tx.send(event).is_ok());
        debug!(revision, ?scope, listeners = listeners.len(), "views invalidated");
    }
}

fn connect(location: &Location) -> Result<Connection> {
    let mut conn = match location {
        Location::File(path) => {
            let conn = Connection::open(path)?;
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;
            debug!(journal_mode = %mode, "journal mode set");
            conn
        }
        Location::Memory => Connection::open_in_memory()?,
    };
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS schema_meta(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        icon TEXT,
        color TEXT,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        amount TEXT NOT NULL, -- positive magnitude, direction in `type`
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        category_id INTEGER,
        note TEXT,
        occurred_at TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
        updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_occurred_at ON transactions(occurred_at);
    CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(type);
    CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
    "#,
    )?;

    if schema_version(conn)? < SCHEMA_VERSION {
        conn.execute(
            "INSERT OR REPLACE INTO schema_meta(key, value) VALUES('schema_version', ?1)",
            [SCHEMA_VERSION.to_string()],
        )?;
    }

    seed_default_categories(conn)?;
    normalize_category_icons(conn)?;
    Ok(())
}

fn schema_version(conn: &Connection) -> Result<i64> {
    use rusqlite::OptionalExtension;
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key='schema_version'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.and_then(|s| s.parse().ok()).unwrap_or(0))
}

/// (name, type, icon, color)
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("Salary", "income", "briefcase", "#2563EB"),
    ("Bonus", "income", "trophy", "#16A34A"),
    ("Freelance", "income", "code", "#0EA5E9"),
    ("Investment", "income", "trending-up", "#22C55E"),
    ("Gift", "income", "gift", "#F97316"),
    ("Food", "expense", "restaurant", "#DC2626"),
    ("Transport", "expense", "car", "#EA580C"),
    ("Shopping", "expense", "cart", "#7C3AED"),
    ("Bills", "expense", "document-text", "#637193"),
    ("Health", "expense", "medkit", "#14B8A6"),
    ("Education", "expense", "school", "#6366F1"),
    ("Entertainment", "expense", "game-controller", "#F59E0B"),
    ("Internet", "expense", "wifi", "#38BDF8"),
    ("Donation", "expense", "heart", "#F43F5E"),
];

fn seed_default_categories(conn: &mut Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }
    let tx = conn.transaction()?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO categories(name, type, icon, color) VALUES (?1, ?2, ?3, ?4)")?;
        for (name, ty, icon, color) in DEFAULT_CATEGORIES {
            stmt.execute((name, ty, icon, color))?;
        }
    }
    tx.commit()?;
    info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    Ok(())
}

/// Older databases used different icon tokens for a few defaults.
const LEGACY_ICONS: &[(&str, &str)] = &[
    ("award", "trophy"),
    ("shopping-bag", "cart"),
    ("utensils", "restaurant"),
    ("file-text", "document-text"),
];

fn normalize_category_icons(conn: &Connection) -> Result<()> {
    for (old, new) in LEGACY_ICONS {
        let n = conn.execute("UPDATE categories SET icon=?1 WHERE icon=?2", (new, old))?;
        if n > 0 {
            debug!(from = old, to = new, rows = n, "normalized category icons");
        }
    }
    Ok(())
}

pub(crate) fn timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    parse_timestamp(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
