// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Week, month and year reporting windows.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::format_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Week,
    Month,
    Year,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Week => "week",
            PeriodKind::Month => "month",
            PeriodKind::Year => "year",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            PeriodKind::Week => "Weekly",
            PeriodKind::Month => "Monthly",
            PeriodKind::Year => "Yearly",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weekly" => Ok(PeriodKind::Week),
            "month" | "monthly" => Ok(PeriodKind::Month),
            "year" | "yearly" => Ok(PeriodKind::Year),
            other => Err(Error::InvalidInput(format!(
                "unknown period '{}', expected week, month or year",
                other
            ))),
        }
    }
}

/// Inclusive reporting window. `start` is local midnight of the first day,
/// `end` is 23:59:59.999 local time on the last day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub kind: PeriodKind,
    pub label: String,
    pub range_label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodRange {
    pub fn start_timestamp(&self) -> String {
        format_timestamp(&self.start)
    }

    pub fn end_timestamp(&self) -> String {
        format_timestamp(&self.end)
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.start <= *at && *at <= self.end
    }
}

fn start_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default()
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or_default()
}

/// Map a wall-clock time to an instant. Ambiguous times take the earlier
/// instant; times inside a DST gap move forward to the first valid minute.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = local;
    for _ in 0..=(24 * 60) {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return dt.with_timezone(&Utc);
            }
            LocalResult::None => match candidate.checked_add_signed(Duration::minutes(1)) {
                Some(next) => candidate = next,
                None => break,
            },
        }
    }
    local.and_utc()
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    // Day zero of the following month.
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Compute the window of `kind` that contains `anchor`, in the anchor's time zone.
pub fn compute_range<Tz: TimeZone>(kind: PeriodKind, anchor: &DateTime<Tz>) -> PeriodRange {
    let tz = anchor.timezone();
    let day = anchor.date_naive();

    let (first, last) = match kind {
        PeriodKind::Week => {
            let back = u64::from(day.weekday().num_days_from_monday());
            let monday = day.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
            (monday, monday.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX))
        }
        PeriodKind::Month => {
            let first = day.with_day(1).unwrap_or(day);
            (first, last_day_of_month(day))
        }
        PeriodKind::Year => (
            NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day),
            NaiveDate::from_ymd_opt(day.year(), 12, 31).unwrap_or(day),
        ),
    };

    let (label, range_label) = match kind {
        PeriodKind::Week => {
            let span = format!("{} - {}", first.format("%-d %b"), last.format("%-d %b"));
            (span.clone(), span)
        }
        PeriodKind::Month => (
            first.format("%B %Y").to_string(),
            format!("{} - {}", first.format("%b %-d"), last.format("%b %-d")),
        ),
        PeriodKind::Year => {
            let year = first.year().to_string();
            (year.clone(), year)
        }
    };

    PeriodRange {
        kind,
        label,
        range_label,
        start: resolve_local(&tz, first.and_time(start_of_day())),
        end: resolve_local(&tz, last.and_time(end_of_day())),
    }
}

/// Move `anchor` by `steps` periods (negative goes back). Month and year steps
/// clamp the day so Jan 31 + 1 month is the last day of February.
///
/// Fails with [`Error::InvalidInput`] when the result would leave the range
/// of representable dates.
pub fn shift_anchor<Tz: TimeZone>(
    kind: PeriodKind,
    anchor: &DateTime<Tz>,
    steps: i32,
) -> crate::error::Result<DateTime<Tz>> {
    let out_of_range = || {
        Error::InvalidInput(format!(
            "shifting {} by {} {}s leaves the supported date range",
            anchor.naive_local(),
            steps,
            kind
        ))
    };
    if steps == 0 {
        return Ok(anchor.clone());
    }
    let months = match kind {
        PeriodKind::Week => {
            let delta = Duration::try_days(7 * i64::from(steps)).ok_or_else(out_of_range)?;
            return anchor.clone().checked_add_signed(delta).ok_or_else(out_of_range);
        }
        PeriodKind::Month => steps.unsigned_abs(),
        PeriodKind::Year => steps
            .unsigned_abs()
            .checked_mul(12)
            .ok_or_else(out_of_range)?,
    };

    // Shift the wall-clock time so the local date moves by whole months even
    // across DST changes.
    let tz = anchor.timezone();
    let local = anchor.naive_local();
    let shifted = if steps > 0 {
        local.checked_add_months(Months::new(months))
    } else {
        local.checked_sub_months(Months::new(months))
    }
    .ok_or_else(out_of_range)?;
    Ok(resolve_local(&tz, shifted).with_timezone(&tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        // 2025-01-01 is a Wednesday.
        let r = compute_range(PeriodKind::Week, &utc(2025, 1, 1));
        assert_eq!(r.start_timestamp(), "2024-12-30T00:00:00.000Z");
        assert_eq!(r.end_timestamp(), "2025-01-05T23:59:59.999Z");
        assert_eq!(r.start.weekday(), Weekday::Mon);
        assert_eq!(r.end.weekday(), Weekday::Sun);
        assert_eq!((r.end.date_naive() - r.start.date_naive()).num_days(), 6);
        assert_eq!(r.range_label, "30 Dec - 5 Jan");
        assert_eq!(r.label, r.range_label);
    }

    #[test]
    fn sunday_anchor_belongs_to_previous_monday() {
        let r = compute_range(PeriodKind::Week, &utc(2025, 1, 12));
        assert_eq!(r.start.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        let r = compute_range(PeriodKind::Week, &utc(2025, 1, 6));
        assert_eq!(r.start.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }

    #[test]
    fn month_handles_leap_february() {
        let r = compute_range(PeriodKind::Month, &utc(2024, 2, 10));
        assert_eq!(r.start_timestamp(), "2024-02-01T00:00:00.000Z");
        assert_eq!(r.end_timestamp(), "2024-02-29T23:59:59.999Z");
        assert_eq!(r.label, "February 2024");
        assert_eq!(r.range_label, "Feb 1 - Feb 29");

        let r = compute_range(PeriodKind::Month, &utc(2025, 2, 10));
        assert_eq!(r.end.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());

        let r = compute_range(PeriodKind::Month, &utc(2025, 12, 31));
        assert_eq!(r.end_timestamp(), "2025-12-31T23:59:59.999Z");
    }

    #[test]
    fn year_spans_calendar_year() {
        let r = compute_range(PeriodKind::Year, &utc(2025, 6, 15));
        assert_eq!(r.start_timestamp(), "2025-01-01T00:00:00.000Z");
        assert_eq!(r.end_timestamp(), "2025-12-31T23:59:59.999Z");
        assert_eq!(r.label, "2025");
        assert_eq!(r.range_label, "2025");
    }

    #[test]
    fn bounds_follow_anchor_zone() {
        let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
        let anchor = jakarta.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap();
        let r = compute_range(PeriodKind::Month, &anchor);
        // Local midnight on March 1st is 17:00 UTC the day before.
        assert_eq!(r.start_timestamp(), "2025-02-28T17:00:00.000Z");
        assert_eq!(r.end_timestamp(), "2025-03-31T16:59:59.999Z");
        assert_eq!(r.label, "March 2025");
    }

    #[test]
    fn start_never_after_end() {
        for kind in [PeriodKind::Week, PeriodKind::Month, PeriodKind::Year] {
            let mut anchor = utc(2023, 1, 1);
            for _ in 0..60 {
                let r = compute_range(kind, &anchor);
                assert!(r.start <= r.end);
                assert!(r.contains(&anchor));
                anchor = anchor + Duration::days(13);
            }
        }
    }

    #[test]
    fn month_shift_clamps_to_shorter_month() {
        let next = shift_anchor(PeriodKind::Month, &utc(2025, 1, 31), 1).unwrap();
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        let next = shift_anchor(PeriodKind::Month, &utc(2024, 1, 31), 1).unwrap();
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let prev = shift_anchor(PeriodKind::Month, &utc(2025, 3, 31), -1).unwrap();
        assert_eq!(prev.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn shift_returns_new_anchor() {
        let anchor = utc(2025, 1, 15);
        let next = shift_anchor(PeriodKind::Week, &anchor, 1).unwrap();
        assert_eq!(anchor, utc(2025, 1, 15));
        assert_eq!(next, utc(2025, 1, 22));
        assert_eq!(shift_anchor(PeriodKind::Week, &anchor, -2).unwrap(), utc(2025, 1, 1));
        assert_eq!(shift_anchor(PeriodKind::Year, &anchor, 1).unwrap(), utc(2026, 1, 15));
        let leap = shift_anchor(PeriodKind::Year, &utc(2024, 2, 29), 1).unwrap();
        assert_eq!(leap.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn parses_period_names() {
        assert_eq!("Monthly".parse::<PeriodKind>().unwrap(), PeriodKind::Month);
        assert_eq!(" week ".parse::<PeriodKind>().unwrap(), PeriodKind::Week);
        assert!("daily".parse::<PeriodKind>().is_err());
    }

    #[test]
    fn shifting_past_representable_dates_is_an_error() {
        let anchor = utc(2025, 1, 1);
        for kind in [PeriodKind::Week, PeriodKind::Month, PeriodKind::Year] {
            assert!(matches!(
                shift_anchor(kind, &anchor, 100_000_000),
                Err(Error::InvalidInput(_))
            ));
            assert!(shift_anchor(kind, &anchor, -100_000_000).is_err());
        }
        assert!(shift_anchor(PeriodKind::Year, &anchor, i32::MAX).is_err());
        assert!(shift_anchor(PeriodKind::Year, &anchor, 1_000).is_ok());
    }

    #[test]
    fn ranges_at_the_calendar_edge_still_compute() {
        let last = NaiveDate::MAX.and_time(end_of_day()).and_utc();
        let first = NaiveDate::MIN.and_time(start_of_day()).and_utc();
        for kind in [PeriodKind::Week, PeriodKind::Month, PeriodKind::Year] {
            let r = compute_range(kind, &last);
            assert!(r.start <= r.end);
            let r = compute_range(kind, &first);
            assert!(r.start <= r.end);
        }
    }

    /// UTC-3 with one summer at UTC-2. Clocks jump from 00:00 to 01:00 on
    /// 2025-03-01 and fall back from 01:00 to 00:00 on 2025-10-01.
    #[derive(Debug, Clone, Copy)]
    struct MidnightDst;

    impl MidnightDst {
        fn offset_at(utc: &NaiveDateTime) -> FixedOffset {
            let summer_starts = NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap();
            let summer_ends = NaiveDate::from_ymd_opt(2025, 10, 1)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap();
            let hours = if (summer_starts..summer_ends).contains(utc) { -2 } else { -3 };
            FixedOffset::east_opt(hours * 3600).unwrap()
        }

        fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<MidnightDst> {
            let naive = NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap();
            MidnightDst.from_local_datetime(&naive).single().unwrap()
        }
    }

    impl TimeZone for MidnightDst {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightDst
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(start_of_day()))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            // Summer offset first so ambiguous times list the earlier instant first.
            let fits: Vec<FixedOffset> = [-2, -3]
                .iter()
                .map(|h| FixedOffset::east_opt(h * 3600).unwrap())
                .filter(|off| {
                    let utc = *local - Duration::seconds(i64::from(off.local_minus_utc()));
                    Self::offset_at(&utc) == *off
                })
                .collect();
            match fits.as_slice() {
                [] => LocalResult::None,
                [one] => LocalResult::Single(*one),
                [earlier, later] => LocalResult::Ambiguous(*earlier, *later),
                _ => unreachable!(),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            Self::offset_at(&utc.and_time(start_of_day()))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            Self::offset_at(utc)
        }
    }

    #[test]
    fn missing_midnight_starts_at_first_valid_instant() {
        let r = compute_range(PeriodKind::Month, &MidnightDst::local(2025, 3, 15, 12, 0));
        assert_eq!(r.start_timestamp(), "2025-03-01T03:00:00.000Z");
        assert_eq!(
            r.start.with_timezone(&MidnightDst).naive_local(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(1, 0, 0).unwrap()
        );
        assert_eq!(r.end_timestamp(), "2025-04-01T01:59:59.999Z");
        assert_eq!(r.label, "March 2025");
    }

    #[test]
    fn repeated_midnight_takes_earlier_instant() {
        let october = compute_range(PeriodKind::Month, &MidnightDst::local(2025, 10, 15, 12, 0));
        assert_eq!(october.start_timestamp(), "2025-10-01T02:00:00.000Z");

        let september = compute_range(PeriodKind::Month, &MidnightDst::local(2025, 9, 15, 12, 0));
        assert_eq!(september.end_timestamp(), "2025-10-01T01:59:59.999Z");
        assert!(september.end < october.start);
    }

    #[test]
    fn shift_into_gap_moves_forward() {
        let anchor = MidnightDst::local(2025, 2, 1, 0, 30);
        let shifted = shift_anchor(PeriodKind::Month, &anchor, 1).unwrap();
        assert_eq!(
            shifted.naive_local(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(1, 0, 0).unwrap()
        );
        assert_eq!(
            shifted.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap()
        );
        let r = compute_range(PeriodKind::Month, &shifted);
        assert_eq!(r.start_timestamp(), "2025-03-01T03:00:00.000Z");
    }
}
