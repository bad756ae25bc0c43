/// Display banding for a completion percentage.
///
/// Three bands: green while there is plenty of time, amber once the due
/// instant is close, red once it has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Comfortable,
    Approaching,
    Overdue,
}

impl Urgency {
    /// Percentage at which an entry stops being comfortable.
    pub const APPROACHING_AT: f64 = 80.0;
    /// Percentage at which an entry is overdue.
    pub const OVERDUE_AT: f64 = 100.0;

    /// ## Summary
    /// Bands a completion percentage.
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent < Self::APPROACHING_AT {
            Self::Comfortable
        } else if percent < Self::OVERDUE_AT {
            Self::Approaching
        } else {
            Self::Overdue
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comfortable => "comfortable",
            Self::Approaching => "approaching",
            Self::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
