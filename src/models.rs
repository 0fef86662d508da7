// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Render an instant the way it is stored: UTC, millisecond precision, `Z` suffix.
/// Strings in this form sort in chronological order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp(s.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Title-cased name, used as the fallback transaction title.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidInput(format!(
                "unknown transaction type '{}', expected income or expense",
                other
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e: Error| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub r#type: TransactionType,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub r#type: TransactionType,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("category name must not be empty".into()));
        }
        Ok(())
    }
}

/// Partial category edit. The category type is fixed at creation and cannot be changed.
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

impl CategoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none() && self.color.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("category name must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub title: String,
    /// Always a positive magnitude; direction comes from `type`.
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub category_id: Option<i64>,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionWithCategory {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
    pub category_color: Option<String>,
}

/// Largest amount a single transaction may carry.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

fn validate_amount(amount: &Decimal) -> Result<()> {
    if *amount <= Decimal::ZERO {
        return Err(Error::InvalidInput(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    if *amount > Decimal::from(MAX_AMOUNT) {
        return Err(Error::InvalidInput(format!(
            "amount must not exceed {}, got {}",
            MAX_AMOUNT, amount
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("transaction title must not be empty".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub title: String,
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub category_id: Option<i64>,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_amount(&self.amount)
    }
}

/// Partial transaction edit. `Some(None)` clears the category or note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub r#type: Option<TransactionType>,
    pub category_id: Option<Option<i64>>,
    pub note: Option<Option<String>>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.r#type.is_none()
            && self.category_id.is_none()
            && self.note.is_none()
            && self.occurred_at.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(amount) = &self.amount {
            validate_amount(amount)?;
        }
        Ok(())
    }
}

/// Filter for transaction listings. Both bounds are inclusive.
/// `limit: None` returns every matching row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilters {
    pub r#type: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdownItem {
    /// `None` is the "Uncategorized" bucket.
    pub id: Option<i64>,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub total: Decimal,
    pub share_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum SegmentKey {
    Category(i64),
    Uncategorized,
    Other,
}

/// One slice of the consolidated spending chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSegment {
    pub key: SegmentKey,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub total: Decimal,
    /// Share against every category in the breakdown; 0 for the Other bucket.
    pub share_percent: f64,
    /// Share against the consolidated chart set.
    pub percent: f64,
}
