//! Live completion percentage for an entry under a recurrence rule.

use chrono::{DateTime, Utc};
use resonator_core::types::Urgency;

use crate::date::CalendarDate;
use crate::rule::{RecurrenceRule, RuleError};

/// Point-in-time projection of progress toward the next due date.
///
/// Recomputed on every poll as a pure function of the rule, the last
/// completion, and `now`; never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Midnight UTC of the next occurrence after the last completion.
    pub expected_completion: DateTime<Utc>,
    /// Elapsed share of the interval, clamped to `[0, 100]`.
    pub percent_complete: f64,
    pub urgency: Urgency,
}

/// ## Summary
/// Projects the expected next completion and the live percentage for a rule
/// and a last completion instant.
///
/// The percentage is elapsed time over the recomputed span between the last
/// completion and the due instant, clamped to `[0, 100]`. The caller
/// supplies `now` so the function stays pure and testable.
///
/// ## Errors
/// Returns an error when the rule has no occurrence after the last
/// completion within the search horizon.
pub fn project(
    rule: &RecurrenceRule,
    last_complete: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<ProgressSnapshot, RuleError> {
    let due_date = rule.next_occurrence(CalendarDate::from_utc(last_complete))?;
    let expected_completion = due_date.midnight_utc();

    let total = (expected_completion - last_complete).num_milliseconds();
    let elapsed = (now - last_complete).num_milliseconds();
    #[expect(clippy::cast_precision_loss, reason = "spans are far below 2^52 ms")]
    let percent_complete = if total <= 0 {
        // The due instant is not ahead of the completion; treat as overdue.
        100.0
    } else {
        (100.0 * elapsed as f64 / total as f64).clamp(0.0, 100.0)
    };

    Ok(ProgressSnapshot {
        expected_completion,
        percent_complete,
        urgency: Urgency::from_percent(percent_complete),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Constraint, Frequency};
    use chrono::TimeZone;

    fn daily_rule(interval: u32) -> RecurrenceRule {
        let start = CalendarDate::from_ymd(2021, 1, 1).expect("valid date");
        RecurrenceRule::new(Frequency::Daily, interval, Constraint::None, None, start)
            .expect("valid rule")
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("valid instant")
    }

    #[test]
    fn percentage_tracks_elapsed_share() {
        let rule = daily_rule(10);
        let last = utc(2021, 1, 1, 0, 0);
        // Halfway through the 10-day span.
        let snapshot = project(&rule, last, utc(2021, 1, 6, 0, 0)).expect("projection");
        assert_eq!(
            snapshot.expected_completion,
            utc(2021, 1, 11, 0, 0)
        );
        assert!((snapshot.percent_complete - 50.0).abs() < 1e-9);
        assert_eq!(snapshot.urgency, Urgency::Comfortable);
    }

    #[test]
    fn percentage_clamps_at_one_hundred() {
        let rule = daily_rule(1);
        let last = utc(2021, 1, 1, 0, 0);
        // Years overdue.
        let snapshot = project(&rule, last, utc(2023, 6, 1, 0, 0)).expect("projection");
        assert!((snapshot.percent_complete - 100.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.urgency, Urgency::Overdue);
    }

    #[test]
    fn percentage_clamps_at_zero_before_the_completion() {
        let rule = daily_rule(10);
        let last = utc(2021, 1, 1, 12, 0);
        // A clock that reads earlier than the completion instant.
        let snapshot = project(&rule, last, utc(2021, 1, 1, 0, 0)).expect("projection");
        assert!(snapshot.percent_complete.abs() < f64::EPSILON);
    }

    #[test]
    fn completion_on_a_due_day_rolls_to_the_next_one() {
        let rule = daily_rule(7);
        // Completed mid-day on an occurrence day: the next due date is a
        // full interval out, not midnight of the same day.
        let last = utc(2021, 1, 8, 15, 0);
        let snapshot = project(&rule, last, last).expect("projection");
        assert_eq!(snapshot.expected_completion, utc(2021, 1, 15, 0, 0));
        assert_eq!(snapshot.urgency, Urgency::Comfortable);
    }

    #[test]
    fn urgency_bands_follow_the_percentage() {
        let rule = daily_rule(10);
        let last = utc(2021, 1, 1, 0, 0);
        let approaching = project(&rule, last, utc(2021, 1, 10, 0, 0)).expect("projection");
        assert_eq!(approaching.urgency, Urgency::Approaching);
        assert!(approaching.percent_complete >= 80.0);

        let overdue = project(&rule, last, utc(2021, 1, 12, 0, 0)).expect("projection");
        assert_eq!(overdue.urgency, Urgency::Overdue);
    }
}
