// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fetches the transactions for a reporting window and runs the analytics over them.

use std::sync::mpsc::{Receiver, TryRecvError};

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::debug;

use crate::analytics::{self, CHART_TOP_N};
use crate::db::{Invalidation, Store};
use crate::error::Result;
use crate::models::{
    CategoryBreakdownItem, ChartSegment, TransactionFilters, TransactionSummary,
    TransactionWithCategory,
};
use crate::period::{self, PeriodKind, PeriodRange};

/// Number of recent transactions on the overview screen.
pub const RECENT_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub range: PeriodRange,
    pub summary: TransactionSummary,
    pub breakdown: Vec<CategoryBreakdownItem>,
    pub segments: Vec<ChartSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub summary: TransactionSummary,
    pub recent: Vec<TransactionWithCategory>,
}

/// Income/expense totals within `range`, or over all time when `None`.
pub fn summary_for(store: &Store, range: Option<&PeriodRange>) -> Result<TransactionSummary> {
    let txs = match range {
        Some(r) => store.list_transactions_in_range(r.start, r.end, None, None)?,
        None => store.list_transactions(&TransactionFilters::default())?,
    };
    Ok(analytics::compute_summary(&txs))
}

pub fn breakdown_for(store: &Store, range: &PeriodRange) -> Result<Vec<CategoryBreakdownItem>> {
    let txs = store.list_transactions_in_range(range.start, range.end, None, None)?;
    let categories = store.list_categories(None)?;
    Ok(analytics::compute_breakdown(&txs, &categories))
}

pub fn report_for_range(store: &Store, range: PeriodRange) -> Result<PeriodReport> {
    let txs = store.list_transactions_in_range(range.start, range.end, None, None)?;
    let categories = store.list_categories(None)?;

    let summary = analytics::compute_summary(&txs);
    let breakdown = analytics::compute_breakdown(&txs, &categories);
    let segments = analytics::consolidate(&breakdown, CHART_TOP_N);
    debug!(
        period = %range.kind,
        start = %range.start_timestamp(),
        end = %range.end_timestamp(),
        transactions = txs.len(),
        groups = breakdown.len(),
        "computed period report"
    );
    Ok(PeriodReport {
        range,
        summary,
        breakdown,
        segments,
    })
}

pub fn period_report<Tz: TimeZone>(
    store: &Store,
    kind: PeriodKind,
    anchor: &DateTime<Tz>,
) -> Result<PeriodReport> {
    report_for_range(store, period::compute_range(kind, anchor))
}

/// All-time totals plus the most recent transactions.
pub fn overview(store: &Store, recent_limit: usize) -> Result<Overview> {
    let summary = summary_for(store, None)?;
    let recent = store.list_transactions_with_category(&TransactionFilters {
        limit: Some(recent_limit),
        ..TransactionFilters::default()
    })?;
    Ok(Overview { summary, recent })
}

/// Keeps the last computed report until the store signals a transaction-affecting
/// mutation or a different window is requested.
pub struct ReportCache {
    events: Receiver<Invalidation>,
    entry: Option<PeriodReport>,
}

impl ReportCache {
    pub fn new(store: &Store) -> Self {
        Self {
            events: store.subscribe(),
            entry: None,
        }
    }

    fn drain(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(ev) if ev.scope.affects_transactions() => {
                    if self.entry.take().is_some() {
                        debug!(revision = ev.revision, "dropped cached report");
                    }
                }
                Ok(_) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    pub fn is_cached(&mut self, range: &PeriodRange) -> bool {
        self.drain();
        self.entry.as_ref().is_some_and(|r| r.range == *range)
    }

    pub fn get(&mut self, store: &Store, range: &PeriodRange) -> Result<&PeriodReport> {
        self.drain();
        let report = match self.entry.take() {
            Some(r) if r.range == *range => r,
            _ => report_for_range(store, range.clone())?,
        };
        Ok(&*self.entry.insert(report))
    }
}
