// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Summary totals and spending breakdowns over a set of transactions.
//!
//! Everything here is a pure function of its inputs. Callers re-run these
//! whenever the underlying transactions change; nothing is memoized.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::{
    Category, CategoryBreakdownItem, ChartSegment, SegmentKey, Transaction, TransactionSummary,
    TransactionType,
};

pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
pub const OTHER_LABEL: &str = "Other";
pub const OTHER_COLOR: &str = "#64748b";
/// Number of categories the spending chart shows before folding the rest into Other.
pub const CHART_TOP_N: usize = 5;

/// Both bounds are inclusive.
pub fn within_range(tx: &Transaction, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
    *start <= tx.occurred_at && tx.occurred_at <= *end
}

pub fn compute_summary(transactions: &[Transaction]) -> TransactionSummary {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for tx in transactions {
        match tx.r#type {
            TransactionType::Income => income = income.saturating_add(tx.amount),
            TransactionType::Expense => expense = expense.saturating_add(tx.amount),
        }
    }
    TransactionSummary {
        income,
        expense,
        net: income.saturating_sub(expense),
    }
}

/// Totals clamp at `Decimal::MAX` instead of overflowing.
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

fn percent_of(part: Decimal, whole: Decimal) -> f64 {
    if whole <= Decimal::ZERO {
        return 0.0;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .unwrap_or(0.0)
}

/// Expense totals per category, largest first. Income never appears here.
///
/// Transactions without a category, or whose category is missing from
/// `categories`, land in a single Uncategorized group with `id: None`.
/// Equal totals keep the order in which their groups were first seen.
pub fn compute_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryBreakdownItem> {
    let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut slots: HashMap<Option<i64>, usize> = HashMap::new();
    let mut groups: Vec<CategoryBreakdownItem> = Vec::new();

    for tx in transactions
        .iter()
        .filter(|tx| tx.r#type == TransactionType::Expense)
    {
        let category = tx.category_id.and_then(|id| by_id.get(&id).copied());
        let key = category.map(|c| c.id);
        let idx = *slots.entry(key).or_insert_with(|| {
            groups.push(match category {
                Some(c) => CategoryBreakdownItem {
                    id: Some(c.id),
                    name: c.name.clone(),
                    icon: c.icon.clone(),
                    color: c.color.clone(),
                    total: Decimal::ZERO,
                    share_percent: 0.0,
                },
                None => CategoryBreakdownItem {
                    id: None,
                    name: UNCATEGORIZED_LABEL.to_string(),
                    icon: None,
                    color: None,
                    total: Decimal::ZERO,
                    share_percent: 0.0,
                },
            });
            groups.len() - 1
        });
        groups[idx].total = groups[idx].total.saturating_add(tx.amount);
    }

    let grand_total = saturating_sum(groups.iter().map(|g| g.total));
    for group in &mut groups {
        group.share_percent = percent_of(group.total, grand_total);
    }
    groups.sort_by(|a, b| b.total.cmp(&a.total));
    groups
}

/// Fold a breakdown into at most `top_n` category segments plus an Other
/// segment for the remainder. Other is only added when the remainder is
/// positive. Each segment's `percent` is measured against the consolidated set.
pub fn consolidate(breakdown: &[CategoryBreakdownItem], top_n: usize) -> Vec<ChartSegment> {
    let mut sorted: Vec<&CategoryBreakdownItem> = breakdown.iter().collect();
    sorted.sort_by(|a, b| b.total.cmp(&a.total));

    let split = top_n.min(sorted.len());
    let (top, rest) = sorted.split_at(split);
    let rest_total = saturating_sum(rest.iter().map(|item| item.total));

    let mut segments: Vec<ChartSegment> = top
        .iter()
        .map(|item| ChartSegment {
            key: match item.id {
                Some(id) => SegmentKey::Category(id),
                None => SegmentKey::Uncategorized,
            },
            name: item.name.clone(),
            icon: item.icon.clone(),
            color: item.color.clone(),
            total: item.total,
            share_percent: item.share_percent,
            percent: 0.0,
        })
        .collect();

    if rest_total > Decimal::ZERO {
        segments.push(ChartSegment {
            key: SegmentKey::Other,
            name: OTHER_LABEL.to_string(),
            icon: None,
            color: Some(OTHER_COLOR.to_string()),
            total: rest_total,
            share_percent: 0.0,
            percent: 0.0,
        });
    }

    let chart_total = saturating_sum(segments.iter().map(|s| s.total));
    for segment in &mut segments {
        segment.percent = percent_of(segment.total, chart_total);
    }
    segments
}
