#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Date-range windows for the map calendar controls.
//!
//! A window is anchored at a selected date and aligned to the mode: the
//! day itself, the Sunday-started week containing it, or its calendar
//! month. All arithmetic is on [`NaiveDateTime`] — host-local wall clock,
//! no timezone normalization.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which window the calendar is showing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DateRangeMode {
    /// The anchor day.
    Today,
    /// The Sunday-started week containing the anchor.
    Week,
    /// The calendar month containing the anchor.
    Month,
}

/// An inclusive `[start, end]` window with millisecond bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Mode-aligned floor (midnight of the day / week / month start).
    pub start: NaiveDateTime,
    /// Corresponding ceiling, 23:59:59.999 of the window's last day.
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Computes the window for `anchor` in the given mode.
    ///
    /// The anchor's time of day is ignored; only its date matters.
    #[must_use]
    pub fn compute(anchor: NaiveDateTime, mode: DateRangeMode) -> Self {
        let day = anchor.date();
        let (first, last) = match mode {
            DateRangeMode::Today => (day, day),
            DateRangeMode::Week => {
                let start = day - Days::new(u64::from(day.weekday().num_days_from_sunday()));
                (start, start + Days::new(6))
            }
            DateRangeMode::Month => {
                let first = first_of_month(day);
                let last = first + Months::new(1) - Days::new(1);
                (first, last)
            }
        };
        Self {
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }

    /// Whether a timestamp falls inside the window.
    ///
    /// Items with no creation timestamp are treated as undated legacy data
    /// and always included.
    #[must_use]
    pub fn includes(&self, created_at: Option<NaiveDateTime>) -> bool {
        created_at.is_none_or(|ts| self.start <= ts && ts <= self.end)
    }

    /// Human label for the window, e.g. `"Jun 15, 2025"`,
    /// `"Jun 15 - Jun 21, 2025"`, or `"June 2025"`.
    #[must_use]
    pub fn label(&self, mode: DateRangeMode) -> String {
        match mode {
            DateRangeMode::Today => self.start.format("%b %-d, %Y").to_string(),
            DateRangeMode::Week => format!(
                "{} - {}",
                self.start.format("%b %-d"),
                self.end.format("%b %-d, %Y")
            ),
            DateRangeMode::Month => self.start.format("%B %Y").to_string(),
        }
    }
}

/// Advances the anchor by one period: a day, seven days, or one calendar
/// month (day-of-month clamped to the target month's length).
#[must_use]
pub fn next_period(anchor: NaiveDateTime, mode: DateRangeMode) -> NaiveDateTime {
    match mode {
        DateRangeMode::Today => anchor + Days::new(1),
        DateRangeMode::Week => anchor + Days::new(7),
        DateRangeMode::Month => anchor + Months::new(1),
    }
}

/// Retreats the anchor by one period.
#[must_use]
pub fn previous_period(anchor: NaiveDateTime, mode: DateRangeMode) -> NaiveDateTime {
    match mode {
        DateRangeMode::Today => anchor - Days::new(1),
        DateRangeMode::Week => anchor - Days::new(7),
        DateRangeMode::Month => anchor - Months::new(1),
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(chrono::NaiveTime::MIN)
}

fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn millis(range: DateRange) -> i64 {
        (range.end - range.start).num_milliseconds()
    }

    #[test]
    fn week_window_for_a_sunday_anchor() {
        // 2025-06-15 is a Sunday, so it starts its own week.
        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Week);
        assert_eq!(
            range.start,
            NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(
            range.end,
            NaiveDate::from_ymd_opt(2025, 6, 21)
                .unwrap()
                .and_hms_milli_opt(23, 59, 59, 999)
                .unwrap()
        );
    }

    #[test]
    fn week_window_floors_to_sunday_midweek() {
        // 2025-06-18 is a Wednesday.
        let range = DateRange::compute(at(2025, 6, 18), DateRangeMode::Week);
        assert_eq!(range.start.date(), NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        assert_eq!(range.end.date(), NaiveDate::from_ymd_opt(2025, 6, 21).unwrap());
    }

    #[test]
    fn anchor_always_inside_its_window() {
        for mode in [DateRangeMode::Today, DateRangeMode::Week, DateRangeMode::Month] {
            for day in [at(2025, 1, 1), at(2025, 6, 18), at(2024, 2, 29), at(2025, 12, 31)] {
                let range = DateRange::compute(day, mode);
                assert!(range.start <= day && day <= range.end, "{mode} {day}");
            }
        }
    }

    #[test]
    fn window_spans_exactly_one_period_minus_a_millisecond() {
        let day = DateRange::compute(at(2025, 6, 15), DateRangeMode::Today);
        assert_eq!(millis(day), 86_400_000 - 1);

        let week = DateRange::compute(at(2025, 6, 15), DateRangeMode::Week);
        assert_eq!(millis(week), 7 * 86_400_000 - 1);

        let june = DateRange::compute(at(2025, 6, 15), DateRangeMode::Month);
        assert_eq!(millis(june), 30 * 86_400_000 - 1);

        let feb_leap = DateRange::compute(at(2024, 2, 10), DateRangeMode::Month);
        assert_eq!(millis(feb_leap), 29 * 86_400_000 - 1);
    }

    #[test]
    fn month_window_covers_whole_month() {
        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Month);
        assert_eq!(range.start.date(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(range.end.date(), NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    }

    #[test]
    fn navigation_shifts_by_one_period() {
        let anchor = at(2025, 6, 15);
        assert_eq!(next_period(anchor, DateRangeMode::Today).date().day(), 16);
        assert_eq!(next_period(anchor, DateRangeMode::Week).date().day(), 22);
        assert_eq!(next_period(anchor, DateRangeMode::Month).date().month(), 7);
        assert_eq!(previous_period(anchor, DateRangeMode::Week).date().day(), 8);

        // Month arithmetic clamps the day instead of overflowing.
        let jan31 = at(2025, 1, 31);
        let feb = next_period(jan31, DateRangeMode::Month);
        assert_eq!((feb.date().month(), feb.date().day()), (2, 28));
    }

    #[test]
    fn navigation_preserves_time_of_day() {
        let anchor = at(2025, 6, 15);
        let shifted = next_period(anchor, DateRangeMode::Week);
        assert_eq!(shifted.hour(), 14);
        assert_eq!(shifted.minute(), 30);
    }

    #[test]
    fn undated_items_always_included() {
        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Today);
        assert!(range.includes(None));
    }

    #[test]
    fn inclusion_is_boundary_inclusive() {
        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Today);
        assert!(range.includes(Some(range.start)));
        assert!(range.includes(Some(range.end)));
        assert!(!range.includes(Some(range.start - chrono::Duration::milliseconds(1))));
        assert!(!range.includes(Some(range.end + chrono::Duration::milliseconds(1))));
    }

    #[test]
    fn filtering_is_idempotent() {
        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Week);
        let stamps: Vec<Option<NaiveDateTime>> = vec![
            None,
            Some(at(2025, 6, 14)),
            Some(at(2025, 6, 16)),
            Some(at(2025, 6, 21)),
            Some(at(2025, 6, 25)),
        ];
        let once: Vec<_> = stamps
            .iter()
            .copied()
            .filter(|ts| range.includes(*ts))
            .collect();
        let twice: Vec<_> = once
            .iter()
            .copied()
            .filter(|ts| range.includes(*ts))
            .collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn labels_follow_mode() {
        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Today);
        assert_eq!(range.label(DateRangeMode::Today), "Jun 15, 2025");

        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Week);
        assert_eq!(range.label(DateRangeMode::Week), "Jun 15 - Jun 21, 2025");

        let range = DateRange::compute(at(2025, 6, 15), DateRangeMode::Month);
        assert_eq!(range.label(DateRangeMode::Month), "June 2025");
    }
}
