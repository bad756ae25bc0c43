//! Inference of recurrence rules from a pair of observed dates.
//!
//! Given the previous occurrence and the user-chosen next occurrence, the
//! generator produces every rule of the supported shapes that is consistent
//! with both dates, most specific first, always ending with a daily
//! fallback.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::{CalendarDate, DateUnit, floor_diff, nth_weekday_index};
use crate::rule::{Constraint, Frequency, RecurrenceRule, WeekdaySet};

/// Which user-supplied endpoint an [`IntervalError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Start,
    Next,
    Both,
}

impl Endpoint {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Next => "next",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalErrorReason {
    Missing,
    InPast,
    Unordered,
}

impl IntervalErrorReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::InPast => "in the past",
            Self::Unordered => "out of order",
        }
    }
}

impl std::fmt::Display for IntervalErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid date pair, reported back to the form as inline field feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{endpoint} date is {reason}")]
pub struct IntervalError {
    pub endpoint: Endpoint,
    pub reason: IntervalErrorReason,
}

impl IntervalError {
    #[must_use]
    pub const fn new(endpoint: Endpoint, reason: IntervalErrorReason) -> Self {
        Self { endpoint, reason }
    }
}

/// Ordered set of rules consistent with a date pair.
///
/// Generation order is preserved: month-grid candidates first, then the
/// weekly candidate, then the daily fallback. Never empty; the first
/// element is the default selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    rules: Vec<RecurrenceRule>,
}

impl CandidateSet {
    /// The default selection offered when the user makes no explicit choice.
    #[must_use]
    pub fn primary(&self) -> &RecurrenceRule {
        &self.rules[0]
    }

    #[must_use]
    pub fn rules(&self) -> &[RecurrenceRule] {
        &self.rules
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a RecurrenceRule;
    type IntoIter = std::slice::Iter<'a, RecurrenceRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// ## Summary
/// Validates a user-chosen date pair before candidate generation: both
/// dates must be at or after `today`, and `start` strictly before `next`.
///
/// ## Errors
/// Returns an [`IntervalError`] naming the offending endpoint(s).
pub fn validate_interval(
    today: CalendarDate,
    start: CalendarDate,
    next: CalendarDate,
) -> Result<(), IntervalError> {
    let start_past = start < today;
    let next_past = next < today;
    if start_past && next_past {
        return Err(IntervalError::new(
            Endpoint::Both,
            IntervalErrorReason::InPast,
        ));
    }
    if start_past {
        return Err(IntervalError::new(
            Endpoint::Start,
            IntervalErrorReason::InPast,
        ));
    }
    if next_past {
        return Err(IntervalError::new(
            Endpoint::Next,
            IntervalErrorReason::InPast,
        ));
    }
    if start >= next {
        return Err(IntervalError::new(
            Endpoint::Next,
            IntervalErrorReason::Unordered,
        ));
    }
    Ok(())
}

/// ## Summary
/// Validates and generates in one step: the single entry point for the
/// entry-creation form, which hands over its two (possibly empty) date
/// fields.
///
/// ## Errors
/// Returns an [`IntervalError`] when a date is missing, in the past, or out
/// of order; generation itself cannot fail.
pub fn candidate_set(
    today: CalendarDate,
    start: Option<CalendarDate>,
    next: Option<CalendarDate>,
) -> Result<CandidateSet, IntervalError> {
    let (start, next) = match (start, next) {
        (Some(start), Some(next)) => (start, next),
        (None, None) => {
            return Err(IntervalError::new(
                Endpoint::Both,
                IntervalErrorReason::Missing,
            ));
        }
        (None, Some(_)) => {
            return Err(IntervalError::new(
                Endpoint::Start,
                IntervalErrorReason::Missing,
            ));
        }
        (Some(_), None) => {
            return Err(IntervalError::new(
                Endpoint::Next,
                IntervalErrorReason::Missing,
            ));
        }
    };
    validate_interval(today, start, next)?;
    Ok(compute_candidates(start, next))
}

/// ## Summary
/// Produces every recurrence rule consistent with both dates.
///
/// Callers must have validated the pair first (`start < next`, both in the
/// future); see [`candidate_set`]. The daily fallback guarantees the result
/// is never empty.
#[must_use]
pub fn compute_candidates(start: CalendarDate, next: CalendarDate) -> CandidateSet {
    let mut rules = Vec::new();
    push_month_grid_candidates(start, next, &mut rules);
    push_weekly_candidate(start, next, &mut rules);
    push_daily_fallback(start, next, &mut rules);
    CandidateSet { rules }
}

/// The yearly-or-monthly base both month-grid candidates build on.
struct MonthGridBase {
    frequency: Frequency,
    interval_count: u32,
    anchor_month: Option<u32>,
}

fn push_month_grid_candidates(
    start: CalendarDate,
    next: CalendarDate,
    rules: &mut Vec<RecurrenceRule>,
) {
    let mut base: Option<MonthGridBase> = None;
    if start.month() == next.month() {
        let year_gap = floor_diff(next, start, DateUnit::Year);
        base = Some(MonthGridBase {
            frequency: Frequency::Yearly,
            interval_count: gap_count(year_gap),
            anchor_month: Some(start.month()),
        });
    }
    let month_gap = floor_diff(next, start, DateUnit::Month);
    if month_gap % 12 != 0 {
        // The gap is not whole years: a monthly base supersedes the yearly
        // one.
        base = Some(MonthGridBase {
            frequency: Frequency::Monthly,
            interval_count: gap_count(month_gap),
            anchor_month: None,
        });
    }
    let Some(base) = base else {
        return;
    };
    if start.day() == next.day() {
        // every <interval> on that day of the month
        rules.push(RecurrenceRule::from_parts(
            base.frequency,
            base.interval_count,
            Constraint::MonthDay(start.day()),
            base.anchor_month,
            start,
        ));
    }
    if start.weekday() == next.weekday() && nth_weekday_index(start) == nth_weekday_index(next) {
        // every <interval> on the nth weekday of the month
        rules.push(RecurrenceRule::from_parts(
            base.frequency,
            base.interval_count,
            Constraint::NthWeekday {
                weekday: start.weekday(),
                nth: nth_weekday_index(start),
            },
            base.anchor_month,
            start,
        ));
    }
}

fn push_weekly_candidate(start: CalendarDate, next: CalendarDate, rules: &mut Vec<RecurrenceRule>) {
    // Only when the weekday matches but the nth index does not; an aligned
    // nth index already produced the month-grid candidate.
    if start.weekday() == next.weekday() && nth_weekday_index(start) != nth_weekday_index(next) {
        let week_gap = floor_diff(next, start, DateUnit::Week);
        rules.push(RecurrenceRule::from_parts(
            Frequency::Weekly,
            gap_count(week_gap),
            Constraint::Weekdays(WeekdaySet::single(start.weekday())),
            None,
            start,
        ));
    }
}

fn push_daily_fallback(start: CalendarDate, next: CalendarDate, rules: &mut Vec<RecurrenceRule>) {
    let day_gap = floor_diff(next, start, DateUnit::Day);
    rules.push(RecurrenceRule::from_parts(
        Frequency::Daily,
        gap_count(day_gap),
        Constraint::None,
        None,
        start,
    ));
}

/// Gaps are non-negative for an ordered pair; the fallback value keeps the
/// rule invariant intact even for out-of-contract input.
fn gap_count(gap: i64) -> u32 {
    u32::try_from(gap).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(year: i32, month: u32, day: u32) -> CalendarDate {
        CalendarDate::from_ymd(year, month, day).expect("valid test date")
    }

    #[test]
    fn first_friday_to_first_friday_is_monthly_by_weekday() {
        // 2021-01-01 and 2021-02-05 are both 1st Fridays.
        let set = compute_candidates(date(2021, 1, 1), date(2021, 2, 5));
        let rules = set.rules();
        assert_eq!(rules.len(), 2);

        assert_eq!(rules[0].frequency(), Frequency::Monthly);
        assert_eq!(rules[0].interval_count(), 1);
        assert_eq!(
            rules[0].constraint(),
            Constraint::NthWeekday {
                weekday: Weekday::Fri,
                nth: 1
            }
        );

        assert_eq!(rules[1].frequency(), Frequency::Daily);
        assert_eq!(rules[1].interval_count(), 35);
    }

    #[test]
    fn same_month_day_a_year_apart_is_yearly() {
        let set = compute_candidates(date(2021, 1, 15), date(2022, 1, 15));
        let rules = set.rules();
        assert_eq!(rules.len(), 2);

        assert_eq!(rules[0].frequency(), Frequency::Yearly);
        assert_eq!(rules[0].interval_count(), 1);
        assert_eq!(rules[0].anchor_month(), Some(1));
        assert_eq!(rules[0].constraint(), Constraint::MonthDay(15));

        assert_eq!(rules[1].frequency(), Frequency::Daily);
        assert_eq!(rules[1].interval_count(), 365);
    }

    #[test]
    fn non_whole_year_gap_prefers_monthly_over_yearly() {
        // Same day of month, 14 months apart: not a whole number of years,
        // so the base candidate must be monthly.
        let set = compute_candidates(date(2021, 1, 15), date(2022, 3, 15));
        let monthly: Vec<_> = set
            .rules()
            .iter()
            .filter(|r| r.frequency() == Frequency::Monthly)
            .collect();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].interval_count(), 14);
        assert_eq!(monthly[0].constraint(), Constraint::MonthDay(15));
        assert!(
            set.rules()
                .iter()
                .all(|r| r.frequency() != Frequency::Yearly)
        );
    }

    #[test]
    fn same_weekday_different_nth_is_weekly() {
        // 2021-01-31 and 2021-02-28 are Sundays with nth 5 and 4.
        let set = compute_candidates(date(2021, 1, 31), date(2021, 2, 28));
        let rules = set.rules();
        assert_eq!(rules.len(), 2);

        assert_eq!(rules[0].frequency(), Frequency::Weekly);
        assert_eq!(rules[0].interval_count(), 4);
        assert_eq!(
            rules[0].constraint(),
            Constraint::Weekdays(WeekdaySet::single(Weekday::Sun))
        );

        assert_eq!(rules[1].frequency(), Frequency::Daily);
    }

    #[test]
    fn weekly_never_coexists_with_nth_weekday() {
        let pairs = [
            (date(2021, 1, 1), date(2021, 2, 5)),
            (date(2021, 1, 31), date(2021, 2, 28)),
            (date(2021, 3, 2), date(2021, 3, 16)),
        ];
        for (start, next) in pairs {
            let set = compute_candidates(start, next);
            let weekly = set
                .rules()
                .iter()
                .any(|r| r.frequency() == Frequency::Weekly);
            let nth = set
                .rules()
                .iter()
                .any(|r| matches!(r.constraint(), Constraint::NthWeekday { .. }));
            assert!(
                !(weekly && nth),
                "weekly and nth-weekday both emitted for {start} -> {next}"
            );
        }
    }

    #[test]
    fn daily_fallback_is_always_last() {
        let pairs = [
            (date(2021, 1, 1), date(2021, 1, 2)),
            (date(2021, 1, 1), date(2021, 2, 5)),
            (date(2021, 1, 15), date(2022, 1, 15)),
            (date(2021, 1, 28), date(2021, 3, 4)),
            (date(2021, 6, 9), date(2024, 2, 29)),
        ];
        for (start, next) in pairs {
            let set = compute_candidates(start, next);
            let last = set.rules().last().expect("non-empty set");
            assert_eq!(last.frequency(), Frequency::Daily);
            assert_eq!(
                i64::from(last.interval_count()),
                floor_diff(next, start, DateUnit::Day)
            );
        }
    }

    #[test]
    fn generated_rules_round_trip_through_next_occurrence() {
        let pairs = [
            (date(2021, 1, 1), date(2021, 2, 5)),
            (date(2021, 1, 15), date(2022, 1, 15)),
            (date(2021, 1, 31), date(2021, 2, 28)),
            (date(2021, 1, 31), date(2021, 3, 31)),
            (date(2021, 3, 2), date(2021, 3, 16)),
            (date(2021, 5, 7), date(2021, 5, 8)),
            (date(2021, 7, 4), date(2022, 7, 4)),
        ];
        for (start, next) in pairs {
            for rule in &compute_candidates(start, next) {
                assert_eq!(
                    rule.next_occurrence(start),
                    Ok(next),
                    "rule `{rule}` generated from {start} -> {next}"
                );
            }
        }
    }

    #[test]
    fn nearby_dates_without_shared_shape_only_get_the_fallback() {
        // Tuesday to Friday of the next week: different weekday, different
        // day of month, no month boundary crossed.
        let set = compute_candidates(date(2021, 3, 2), date(2021, 3, 12));
        assert_eq!(set.rules().len(), 1);
        assert_eq!(set.primary().frequency(), Frequency::Daily);
        assert_eq!(set.primary().interval_count(), 10);
    }

    #[test]
    fn start_in_the_past_is_rejected_before_generation() {
        let today = date(2021, 6, 9);
        let err = candidate_set(today, Some(date(2021, 6, 1)), Some(date(2021, 6, 20)))
            .expect_err("start in the past");
        assert_eq!(err.endpoint, Endpoint::Start);
        assert_eq!(err.reason, IntervalErrorReason::InPast);
    }

    #[test]
    fn both_dates_in_the_past_name_both_endpoints() {
        let today = date(2021, 6, 9);
        let err = candidate_set(today, Some(date(2021, 6, 1)), Some(date(2021, 6, 5)))
            .expect_err("both in the past");
        assert_eq!(err.endpoint, Endpoint::Both);
    }

    #[test]
    fn unordered_dates_are_rejected() {
        let today = date(2021, 6, 9);
        let err = validate_interval(today, date(2021, 6, 20), date(2021, 6, 10))
            .expect_err("unordered");
        assert_eq!(err.reason, IntervalErrorReason::Unordered);

        let err = validate_interval(today, date(2021, 6, 20), date(2021, 6, 20))
            .expect_err("equal dates");
        assert_eq!(err.reason, IntervalErrorReason::Unordered);
    }

    #[test]
    fn missing_dates_are_rejected() {
        let today = date(2021, 6, 9);
        let err = candidate_set(today, None, Some(date(2021, 6, 20))).expect_err("missing start");
        assert_eq!(err.endpoint, Endpoint::Start);
        assert_eq!(err.reason, IntervalErrorReason::Missing);

        let err = candidate_set(today, None, None).expect_err("missing both");
        assert_eq!(err.endpoint, Endpoint::Both);
    }

    #[test]
    fn valid_pair_flows_through_candidate_set() {
        let today = date(2021, 1, 1);
        let set = candidate_set(today, Some(date(2021, 1, 1)), Some(date(2021, 2, 5)))
            .expect("valid pair");
        assert_eq!(set.primary().frequency(), Frequency::Monthly);
    }

    #[test]
    fn error_message_names_the_endpoint() {
        let err = IntervalError::new(Endpoint::Start, IntervalErrorReason::InPast);
        assert_eq!(err.to_string(), "start date is in the past");
    }
}
