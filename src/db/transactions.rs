// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, ToSql, params};
use tracing::{debug, info};

use super::{NOW_SQL, Store, ViewScope, decimal_col, timestamp_col};
use crate::error::{Error, Result};
use crate::models::{
    NewTransaction, Transaction, TransactionFilters, TransactionType, TransactionUpdate,
    TransactionWithCategory, format_timestamp,
};

/// Page size used by the transaction history screen.
pub const DEFAULT_LIST_LIMIT: usize = 100;

const TRANSACTION_COLUMNS: &str = "t.id, t.title, t.amount, t.type, t.category_id, t.note, \
     t.occurred_at, t.created_at, t.updated_at";

fn map_transaction(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        title: r.get(1)?,
        amount: decimal_col(r, 2)?,
        r#type: r.get(3)?,
        category_id: r.get(4)?,
        note: r.get(5)?,
        occurred_at: timestamp_col(r, 6)?,
        created_at: timestamp_col(r, 7)?,
        updated_at: timestamp_col(r, 8)?,
    })
}

fn map_transaction_with_category(r: &Row<'_>) -> rusqlite::Result<TransactionWithCategory> {
    Ok(TransactionWithCategory {
        transaction: map_transaction(r)?,
        category_name: r.get(9)?,
        category_icon: r.get(10)?,
        category_color: r.get(11)?,
    })
}

/// WHERE/ORDER/LIMIT tail for a filtered listing over `transactions t`.
fn filter_sql(filters: &TransactionFilters) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(kind) = filters.r#type {
        clauses.push("t.type=?");
        values.push(Box::new(kind));
    }
    if let Some(cat) = filters.category_id {
        clauses.push("t.category_id=?");
        values.push(Box::new(cat));
    }
    if let Some(start) = &filters.start {
        clauses.push("t.occurred_at>=?");
        values.push(Box::new(format_timestamp(start)));
    }
    if let Some(end) = &filters.end {
        clauses.push("t.occurred_at<=?");
        values.push(Box::new(format_timestamp(end)));
    }

    let mut sql = String::new();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY t.occurred_at DESC, t.id DESC");

    match filters.limit {
        Some(limit) => {
            sql.push_str(" LIMIT ? OFFSET ?");
            values.push(Box::new(limit as i64));
            values.push(Box::new(filters.offset as i64));
        }
        None if filters.offset > 0 => {
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
            sql.push_str(" LIMIT -1 OFFSET ?");
            values.push(Box::new(filters.offset as i64));
        }
        None => {}
    }
    (sql, values)
}

impl Store {
    pub fn list_transactions(&self, filters: &TransactionFilters) -> Result<Vec<Transaction>> {
        let (tail, values) = filter_sql(filters);
        let sql = format!("SELECT {} FROM transactions t{}", TRANSACTION_COLUMNS, tail);
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(refs.as_slice(), map_transaction)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        debug!(count = data.len(), "listed transactions");
        Ok(data)
    }

    pub fn list_transactions_with_category(
        &self,
        filters: &TransactionFilters,
    ) -> Result<Vec<TransactionWithCategory>> {
        let (tail, values) = filter_sql(filters);
        let sql = format!(
            "SELECT {}, c.name, c.icon, c.color FROM transactions t \
             LEFT JOIN categories c ON t.category_id=c.id{}",
            TRANSACTION_COLUMNS, tail
        );
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(refs.as_slice(), map_transaction_with_category)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        debug!(count = data.len(), "listed transactions with categories");
        Ok(data)
    }

    /// Every transaction with `start <= occurred_at <= end`, newest first.
    pub fn list_transactions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: Option<TransactionType>,
        category_id: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        self.list_transactions(&TransactionFilters {
            r#type: kind,
            category_id,
            start: Some(start),
            end: Some(end),
            limit: None,
            offset: 0,
        })
    }

    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.id=?1",
            TRANSACTION_COLUMNS
        );
        let t = self
            .conn()
            .query_row(&sql, params![id], map_transaction)
            .optional()?;
        Ok(t)
    }

    pub fn add_transaction(&self, input: &NewTransaction) -> Result<i64> {
        input.validate()?;
        self.conn().execute(
            "INSERT INTO transactions(title, amount, type, category_id, note, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.title.trim(),
                input.amount.to_string(),
                input.r#type,
                input.category_id,
                input.note,
                format_timestamp(&input.occurred_at),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        info!(id, kind = %input.r#type, amount = %input.amount, "added transaction");
        self.notify(ViewScope::Transactions);
        Ok(id)
    }

    /// Apply a partial edit and refresh `updated_at`. An empty update is a no-op.
    pub fn update_transaction(&self, id: i64, update: &TransactionUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        update.validate()?;

        let mut fields: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(title) = &update.title {
            fields.push("title=?".into());
            values.push(Box::new(title.trim().to_string()));
        }
        if let Some(amount) = &update.amount {
            fields.push("amount=?".into());
            values.push(Box::new(amount.to_string()));
        }
        if let Some(kind) = update.r#type {
            fields.push("type=?".into());
            values.push(Box::new(kind));
        }
        if let Some(cat) = update.category_id {
            fields.push("category_id=?".into());
            values.push(Box::new(cat));
        }
        if let Some(note) = &update.note {
            fields.push("note=?".into());
            values.push(Box::new(note.clone()));
        }
        if let Some(at) = &update.occurred_at {
            fields.push("occurred_at=?".into());
            values.push(Box::new(format_timestamp(at)));
        }
        fields.push(format!("updated_at={}", NOW_SQL));
        values.push(Box::new(id));

        let sql = format!("UPDATE transactions SET {} WHERE id=?", fields.join(", "));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let changed = self.conn().execute(&sql, refs.as_slice())?;
        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        info!(id, "updated transaction");
        self.notify(ViewScope::Transactions);
        Ok(())
    }

    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        let removed = self
            .conn()
            .execute("DELETE FROM transactions WHERE id=?1", params![id])?;
        if removed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        info!(id, "deleted transaction");
        self.notify(ViewScope::Transactions);
        Ok(())
    }

    /// Remove every transaction. Categories are kept.
    pub fn delete_all_transactions(&self) -> Result<usize> {
        let removed = self.conn().execute("DELETE FROM transactions", [])?;
        info!(removed, "deleted all transactions");
        self.notify(ViewScope::Transactions);
        Ok(removed)
    }
}
