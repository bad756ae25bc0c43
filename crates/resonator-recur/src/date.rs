//! Day-granular calendar arithmetic.
//!
//! Everything here operates on UTC dates truncated to the day; comparisons
//! and differences floor both operands to a unit boundary before measuring.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Granularity for floor-aligned date differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for DateUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timezone-normalized calendar point: UTC, truncated to the day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a date from calendar components, or `None` when they do not
    /// name a real date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Truncates an instant to its UTC calendar day.
    #[must_use]
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self(instant.date_naive())
    }

    #[must_use]
    pub fn today() -> Self {
        Self::from_utc(Utc::now())
    }

    #[must_use]
    pub const fn inner(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// 1-based month.
    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// 1-based day of month.
    #[must_use]
    pub fn day(self) -> u32 {
        self.0.day()
    }

    #[must_use]
    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// Midnight UTC at this date, for duration arithmetic.
    #[must_use]
    pub fn midnight_utc(self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    #[must_use]
    pub fn plus_days(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Start of the week containing this date. Weeks start on Sunday.
    #[must_use]
    pub fn start_of_week(self) -> Self {
        Self(self.0.week(Weekday::Sun).first_day())
    }

    #[must_use]
    pub fn start_of_month(self) -> Self {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1).map_or(self, Self)
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// ## Summary
/// Floor-aligned difference between two calendar points.
///
/// Both operands are truncated to the start of `unit`, then the difference
/// is returned in whole `unit`s. The sign follows the chronological order of
/// the truncated values; the result is zero when both truncate identically.
#[must_use]
pub fn floor_diff(a: CalendarDate, b: CalendarDate, unit: DateUnit) -> i64 {
    match unit {
        DateUnit::Day => (a.inner() - b.inner()).num_days(),
        DateUnit::Week => {
            (a.start_of_week().inner() - b.start_of_week().inner()).num_days() / 7
        }
        DateUnit::Month => month_index(a) - month_index(b),
        DateUnit::Year => i64::from(a.year()) - i64::from(b.year()),
    }
}

/// Months elapsed since the common era, used as a linear month axis.
fn month_index(date: CalendarDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month()) - 1
}

/// ## Summary
/// 1-based ordinal of `date`'s weekday within its month: for the 3rd
/// Saturday of a month this returns 3.
///
/// Steps back a week at a time while still inside the month, counting the
/// starting date. A 5th occurrence exists only in some months; rules built
/// from an ordinal of 5 skip the months that lack one.
#[must_use]
pub fn nth_weekday_index(date: CalendarDate) -> u8 {
    let mut count: u8 = 0;
    let mut current = date.inner();
    while current.month() == date.month() {
        current -= Duration::days(7);
        count += 1;
    }
    count
}

/// ## Summary
/// Calendar month reached by stepping `delta` whole months from
/// `(year, month)`.
#[must_use]
pub fn shift_month(year: i32, month: u32, delta: i64) -> (i32, u32) {
    let total = i64::from(year) * 12 + i64::from(month) - 1 + delta;
    let shifted_year = i32::try_from(total.div_euclid(12)).unwrap_or(i32::MAX);
    let shifted_month = u32::try_from(total.rem_euclid(12) + 1).unwrap_or(1);
    (shifted_year, shifted_month)
}
