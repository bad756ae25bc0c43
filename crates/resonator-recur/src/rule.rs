//! Recurrence rule value type and occurrence search.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::{CalendarDate, DateUnit, floor_diff, shift_month};

/// How many frequency periods `next_occurrence` will inspect before giving
/// up. Only constraints that can never resolve (February 30th, a 5th
/// weekday that no month on the grid has) exhaust it.
const SEARCH_HORIZON: u32 = 600;

/// Recurrence rule construction and evaluation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("interval count must be at least 1")]
    ZeroInterval,
    #[error("day of month must be within 1..=31, got {0}")]
    MonthDayOutOfRange(u32),
    #[error("weekday ordinal must be within 1..=5, got {0}")]
    NthOutOfRange(u8),
    #[error("anchor month must be within 1..=12, got {0}")]
    AnchorMonthOutOfRange(u32),
    #[error("anchor month applies to yearly rules only")]
    AnchorMonthWithoutYearly,
    #[error("weekday set is empty")]
    EmptyWeekdaySet,
    #[error("{constraint} constraint cannot be combined with a {frequency} frequency")]
    ConstraintMismatch {
        frequency: Frequency,
        constraint: &'static str,
    },
    #[error("no matching occurrence within {0} periods")]
    NoOccurrence(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// The calendar unit one period of this frequency spans.
    #[must_use]
    pub const fn unit(self) -> DateUnit {
        match self {
            Self::Daily => DateUnit::Day,
            Self::Weekly => DateUnit::Week,
            Self::Monthly => DateUnit::Month,
            Self::Yearly => DateUnit::Year,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of weekdays stored as a bitmask, Monday in the lowest bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdaySet(u8);

/// Weekdays in bitmask order.
const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl WeekdaySet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn single(weekday: Weekday) -> Self {
        Self::empty().with(weekday)
    }

    #[must_use]
    pub fn with(self, weekday: Weekday) -> Self {
        Self(self.0 | 1 << weekday.num_days_from_monday())
    }

    #[must_use]
    pub fn contains(self, weekday: Weekday) -> bool {
        (self.0 & (1 << weekday.num_days_from_monday())) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Weekdays in the set, Monday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEKDAY_ORDER.into_iter().filter(move |wd| self.contains(*wd))
    }
}

/// Day-level constraint attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// No constraint beyond the frequency step.
    None,
    /// Fixed weekdays within the stepped week.
    Weekdays(WeekdaySet),
    /// Fixed 1-based day within the stepped month.
    MonthDay(u32),
    /// Nth occurrence of a weekday within the stepped month.
    NthWeekday { weekday: Weekday, nth: u8 },
}

impl Constraint {
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Weekdays(_) => "weekday-set",
            Self::MonthDay(_) => "month-day",
            Self::NthWeekday { .. } => "nth-weekday",
        }
    }
}

/// One recurrence pattern: a frequency, an interval count, and an optional
/// day-level constraint, anchored at a start date.
///
/// Immutable once constructed; editing a rule always produces a fresh value.
/// Deserialization goes through [`RecurrenceRule::new`], so a rule read from
/// a file carries the same guarantees as one built in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleParts")]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval_count: u32,
    constraint: Constraint,
    anchor_month: Option<u32>,
    start_date: CalendarDate,
}

/// Wire shape of a rule, converted through the validating constructor.
#[derive(Deserialize)]
struct RuleParts {
    frequency: Frequency,
    interval_count: u32,
    constraint: Constraint,
    #[serde(default)]
    anchor_month: Option<u32>,
    start_date: CalendarDate,
}

impl TryFrom<RuleParts> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(parts: RuleParts) -> Result<Self, Self::Error> {
        Self::new(
            parts.frequency,
            parts.interval_count,
            parts.constraint,
            parts.anchor_month,
            parts.start_date,
        )
    }
}

impl RecurrenceRule {
    /// ## Summary
    /// Builds a validated rule.
    ///
    /// ## Errors
    /// Returns an error when the interval count is zero, a constraint field
    /// is out of range, the constraint does not fit the frequency, or the
    /// anchor month is set on a non-yearly rule.
    pub fn new(
        frequency: Frequency,
        interval_count: u32,
        constraint: Constraint,
        anchor_month: Option<u32>,
        start_date: CalendarDate,
    ) -> Result<Self, RuleError> {
        if interval_count == 0 {
            return Err(RuleError::ZeroInterval);
        }
        match constraint {
            Constraint::None => {}
            Constraint::Weekdays(set) => {
                if set.is_empty() {
                    return Err(RuleError::EmptyWeekdaySet);
                }
                if frequency != Frequency::Weekly {
                    return Err(RuleError::ConstraintMismatch {
                        frequency,
                        constraint: constraint.kind(),
                    });
                }
            }
            Constraint::MonthDay(day) => {
                if !(1..=31).contains(&day) {
                    return Err(RuleError::MonthDayOutOfRange(day));
                }
                Self::require_month_grid(frequency, constraint)?;
            }
            Constraint::NthWeekday { nth, .. } => {
                if !(1..=5).contains(&nth) {
                    return Err(RuleError::NthOutOfRange(nth));
                }
                Self::require_month_grid(frequency, constraint)?;
            }
        }
        if let Some(month) = anchor_month {
            if frequency != Frequency::Yearly {
                return Err(RuleError::AnchorMonthWithoutYearly);
            }
            if !(1..=12).contains(&month) {
                return Err(RuleError::AnchorMonthOutOfRange(month));
            }
        }
        Ok(Self {
            frequency,
            interval_count,
            constraint,
            anchor_month,
            start_date,
        })
    }

    fn require_month_grid(frequency: Frequency, constraint: Constraint) -> Result<(), RuleError> {
        if matches!(frequency, Frequency::Monthly | Frequency::Yearly) {
            Ok(())
        } else {
            Err(RuleError::ConstraintMismatch {
                frequency,
                constraint: constraint.kind(),
            })
        }
    }

    /// Constructor for parameters the candidate generator has already
    /// proven valid.
    pub(crate) const fn from_parts(
        frequency: Frequency,
        interval_count: u32,
        constraint: Constraint,
        anchor_month: Option<u32>,
        start_date: CalendarDate,
    ) -> Self {
        Self {
            frequency,
            interval_count,
            constraint,
            anchor_month,
            start_date,
        }
    }

    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    #[must_use]
    pub const fn interval_count(&self) -> u32 {
        self.interval_count
    }

    #[must_use]
    pub const fn constraint(&self) -> Constraint {
        self.constraint
    }

    #[must_use]
    pub const fn anchor_month(&self) -> Option<u32> {
        self.anchor_month
    }

    #[must_use]
    pub const fn start_date(&self) -> CalendarDate {
        self.start_date
    }

    /// ## Summary
    /// Earliest occurrence of this rule strictly after both `after` and the
    /// anchor date.
    ///
    /// Occurrences live on the period grid reachable from the anchor by
    /// whole multiples of the interval count; within a period the constraint
    /// picks the day. Pure: identical inputs always give identical results.
    ///
    /// ## Errors
    /// Returns `RuleError::NoOccurrence` when no period within the search
    /// horizon contains a matching day (months missing the requested
    /// month-day or weekday ordinal are skipped, never clamped).
    pub fn next_occurrence(&self, after: CalendarDate) -> Result<CalendarDate, RuleError> {
        let lower = after.max(self.start_date).plus_days(1);
        match self.frequency {
            Frequency::Daily => Ok(self.next_daily(lower)),
            Frequency::Weekly => self.next_weekly(lower),
            Frequency::Monthly | Frequency::Yearly => self.next_on_month_grid(lower),
        }
    }

    fn next_daily(&self, lower: CalendarDate) -> CalendarDate {
        let interval = i64::from(self.interval_count);
        let gap = floor_diff(lower, self.start_date, DateUnit::Day);
        let steps = gap.div_euclid(interval) + i64::from(gap.rem_euclid(interval) != 0);
        self.start_date.plus_days(steps.max(1) * interval)
    }

    fn next_weekly(&self, lower: CalendarDate) -> Result<CalendarDate, RuleError> {
        let set = match self.constraint {
            Constraint::Weekdays(set) => set,
            _ => WeekdaySet::single(self.start_date.weekday()),
        };
        let interval = i64::from(self.interval_count);
        let start_week = self.start_date.start_of_week();
        let mut week_gap = floor_diff(lower, self.start_date, DateUnit::Week).max(0);
        // Align down onto the interval grid anchored at the start week; the
        // per-day lower-bound check skips anything too early.
        week_gap -= week_gap.rem_euclid(interval);
        for _ in 0..SEARCH_HORIZON {
            let week_start = start_week.plus_days(week_gap * 7);
            for offset in 0..7 {
                let day = week_start.plus_days(offset);
                if day >= lower && set.contains(day.weekday()) {
                    return Ok(day);
                }
            }
            week_gap += interval;
        }
        Err(RuleError::NoOccurrence(SEARCH_HORIZON))
    }

    fn next_on_month_grid(&self, lower: CalendarDate) -> Result<CalendarDate, RuleError> {
        // Yearly rules walk the same month grid in 12-month strides so one
        // resolution path covers both frequencies.
        let months_per_step = match self.frequency {
            Frequency::Yearly => i64::from(self.interval_count) * 12,
            _ => i64::from(self.interval_count),
        };
        let anchor_year = self.start_date.year();
        let anchor_month = match (self.frequency, self.anchor_month) {
            (Frequency::Yearly, Some(month)) => month,
            _ => self.start_date.month(),
        };

        let anchor_index = i64::from(anchor_year) * 12 + i64::from(anchor_month) - 1;
        let lower_index = i64::from(lower.year()) * 12 + i64::from(lower.month()) - 1;
        let mut gap = (lower_index - anchor_index).max(0);
        gap -= gap.rem_euclid(months_per_step);
        for _ in 0..SEARCH_HORIZON {
            let (year, month) = shift_month(anchor_year, anchor_month, gap);
            if let Some(day) = self.resolve_in_month(year, month) {
                if day >= lower {
                    return Ok(day);
                }
            }
            gap += months_per_step;
        }
        Err(RuleError::NoOccurrence(SEARCH_HORIZON))
    }

    /// Resolves the constraint within a single month, or `None` when the
    /// month lacks the requested day or weekday ordinal.
    fn resolve_in_month(&self, year: i32, month: u32) -> Option<CalendarDate> {
        match self.constraint {
            Constraint::MonthDay(day) => CalendarDate::from_ymd(year, month, day),
            Constraint::NthWeekday { weekday, nth } => {
                NaiveDate::from_weekday_of_month_opt(year, month, weekday, nth)
                    .map(CalendarDate::new)
            }
            // An unconstrained month-grid rule lands on the anchor's day.
            Constraint::None | Constraint::Weekdays(_) => {
                CalendarDate::from_ymd(year, month, self.start_date.day())
            }
        }
    }
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.interval_count == 1 {
            write!(f, "every {}", self.frequency.unit())?;
        } else {
            write!(f, "every {} {}s", self.interval_count, self.frequency.unit())?;
        }
        if let Some(month) = self.anchor_month {
            write!(f, " in {}", month_name(month))?;
        }
        match self.constraint {
            Constraint::None => {}
            Constraint::Weekdays(set) => {
                let mut sep = " on ";
                for weekday in set.iter() {
                    write!(f, "{sep}{}", weekday_name(weekday))?;
                    sep = ", ";
                }
            }
            Constraint::MonthDay(day) => write!(f, " on day {day}")?,
            Constraint::NthWeekday { weekday, nth } => {
                write!(f, " on the {} {}", ordinal(nth), weekday_name(weekday))?;
            }
        }
        Ok(())
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "?",
    }
}

fn ordinal(nth: u8) -> &'static str {
    match nth {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        4 => "4th",
        _ => "5th",
    }
}
