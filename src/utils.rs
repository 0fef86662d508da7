// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Noon local time on `date`, clear of any midnight DST transition.
pub fn local_noon(date: NaiveDate) -> Result<DateTime<Local>> {
    let naive = date
        .and_hms_opt(12, 0, 0)
        .with_context(|| format!("Invalid date {}", date))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("{} does not exist in the local time zone", naive))
}

/// Accept either a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date (noon local time).
pub fn parse_when(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = parse_date(s)
        .with_context(|| format!("Invalid time '{}', expected RFC 3339 or YYYY-MM-DD", s))?;
    Ok(local_noon(date)?.with_timezone(&Utc))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn fmt_percent(p: f64) -> String {
    format!("{:.1}%", p)
}

pub fn arg<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a String> {
    m.get_one::<String>(id)
        .with_context(|| format!("Missing required argument --{}", id))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_when_accepts_both_forms() {
        let at = parse_when("2025-03-04T05:06:07Z").unwrap();
        assert_eq!(at.to_rfc3339(), "2025-03-04T05:06:07+00:00");
        let noon = parse_when(" 2025-03-04 ").unwrap();
        assert_eq!(noon.with_timezone(&Local).date_naive().to_string(), "2025-03-04");
        assert!(parse_when("yesterday").is_err());
    }

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(fmt_money(&"12.346".parse().unwrap()), "12.35");
        assert_eq!(fmt_money(&Decimal::ZERO), "0.00");
        assert_eq!(fmt_percent(66.6666), "66.7%");
    }
}
