// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{OptionalExtension, Row, ToSql, params};
use tracing::{debug, info};

use super::{NOW_SQL, Store, ViewScope, timestamp_col};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryUpdate, NewCategory, TransactionType};

const CATEGORY_COLUMNS: &str = "id, name, type, icon, color, created_at";

fn map_category(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        r#type: r.get(2)?,
        icon: r.get(3)?,
        color: r.get(4)?,
        created_at: timestamp_col(r, 5)?,
    })
}

impl Store {
    /// Categories ordered by name, optionally restricted to one type.
    pub fn list_categories(&self, kind: Option<TransactionType>) -> Result<Vec<Category>> {
        let mut sql = format!("SELECT {} FROM categories", CATEGORY_COLUMNS);
        if kind.is_some() {
            sql.push_str(" WHERE type=?1");
        }
        sql.push_str(" ORDER BY name ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = match kind {
            Some(k) => stmt.query_map(params![k], map_category)?,
            None => stmt.query_map([], map_category)?,
        };
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        debug!(count = data.len(), ?kind, "listed categories");
        Ok(data)
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id=?1", CATEGORY_COLUMNS);
        let c = self
            .conn()
            .query_row(&sql, params![id], map_category)
            .optional()?;
        Ok(c)
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored.
    pub fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE name=?1", CATEGORY_COLUMNS);
        let c = self
            .conn()
            .query_row(&sql, params![name.trim()], map_category)
            .optional()?;
        Ok(c)
    }

    pub fn add_category(&self, input: &NewCategory) -> Result<i64> {
        input.validate()?;
        let name = input.name.trim();
        self.conn().execute(
            "INSERT INTO categories(name, type, icon, color) VALUES (?1, ?2, ?3, ?4)",
            params![name, input.r#type, input.icon, input.color],
        )?;
        let id = self.conn().last_insert_rowid();
        info!(id, name, kind = %input.r#type, "added category");
        self.notify(ViewScope::Categories);
        Ok(id)
    }

    /// Apply a partial edit. An empty update is a no-op.
    pub fn update_category(&self, id: i64, update: &CategoryUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        update.validate()?;

        let mut fields: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(name) = &update.name {
            fields.push("name=?");
            values.push(Box::new(name.trim().to_string()));
        }
        if let Some(icon) = &update.icon {
            fields.push("icon=?");
            values.push(Box::new(icon.clone()));
        }
        if let Some(color) = &update.color {
            fields.push("color=?");
            values.push(Box::new(color.clone()));
        }
        values.push(Box::new(id));

        let sql = format!("UPDATE categories SET {} WHERE id=?", fields.join(", "));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let changed = self.conn().execute(&sql, refs.as_slice())?;
        if changed == 0 {
            return Err(Error::NotFound(format!("category {}", id)));
        }
        info!(id, "updated category");
        self.notify(ViewScope::All);
        Ok(())
    }

    /// Delete a category. Transactions that referenced it stay, uncategorized.
    pub fn delete_category(&self, id: i64) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        let detached = tx.execute(
            &format!(
                "UPDATE transactions SET category_id=NULL, updated_at={} WHERE category_id=?1",
                NOW_SQL
            ),
            params![id],
        )?;
        let removed = tx.execute("DELETE FROM categories WHERE id=?1", params![id])?;
        if removed == 0 {
            return Err(Error::NotFound(format!("category {}", id)));
        }
        tx.commit()?;
        info!(id, detached, "deleted category");
        self.notify(ViewScope::All);
        Ok(())
    }
}
