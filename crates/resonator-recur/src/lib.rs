//! Resonator recurrence engine.
//!
//! Infers calendar recurrence rules from a pair of observed dates, searches
//! for the next occurrence of a rule, and projects a live completion
//! percentage for an entry. Every operation is a pure function of its
//! explicit inputs; the only task-shaped piece is the cancellable
//! [`monitor::ProgressMonitor`] that re-projects on a fixed cadence.

pub mod candidates;
pub mod date;
pub mod entry;
pub mod monitor;
pub mod progress;
pub mod rule;

pub use candidates::{CandidateSet, Endpoint, IntervalError, candidate_set, compute_candidates};
pub use date::{CalendarDate, DateUnit, floor_diff, nth_weekday_index};
pub use entry::Entry;
pub use progress::{ProgressSnapshot, project};
pub use rule::{Constraint, Frequency, RecurrenceRule, RuleError, WeekdaySet};
