//! Tracked obligation with its completion state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rule::RecurrenceRule;

/// A recurring obligation: something that has to be done again every
/// interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub last_complete_time: DateTime<Utc>,
    pub interval: RecurrenceRule,
}

impl Entry {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        last_complete_time: DateTime<Utc>,
        interval: RecurrenceRule,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            last_complete_time,
            interval,
        }
    }

    /// Marks the entry done at `at`; the only mutation an entry supports.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.last_complete_time = at;
    }
}
