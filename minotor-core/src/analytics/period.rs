//! Relative time windows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::CanonicalEvent;

/// A named window looking back from "now".
///
/// `Month` is a fixed 30 days, not a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Last 24 hours
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// No lower bound
    #[default]
    All,
}

impl Period {
    pub const ALL_PERIODS: [Period; 4] = [Period::Today, Period::Week, Period::Month, Period::All];

    /// Length of the window, `None` for [`Period::All`].
    pub fn span(&self) -> Option<Duration> {
        match self {
            Period::Today => Some(Duration::hours(24)),
            Period::Week => Some(Duration::days(7)),
            Period::Month => Some(Duration::days(30)),
            Period::All => None,
        }
    }

    /// Instant an event must be strictly after to fall in the window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.span().map(|span| now - span)
    }

    /// Whether an event belongs to this window.
    ///
    /// Undated events never match, not even for [`Period::All`].
    pub fn contains(&self, event: &CanonicalEvent, now: DateTime<Utc>) -> bool {
        match (event.timestamp, self.cutoff(now)) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(ts), Some(cutoff)) => ts > cutoff,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::All => "all",
        }
    }

    /// Phrase used after an event count, e.g. "12 events this week".
    pub fn label(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "this week",
            Period::Month => "this month",
            Period::All => "in total",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => Err(format!(
                "unknown period: {} (expected today, week, month or all)",
                other
            )),
        }
    }
}

/// Keep the events inside `period`, preserving their order.
pub fn filter_by_period(
    events: &[CanonicalEvent],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<CanonicalEvent> {
    events
        .iter()
        .filter(|event| period.contains(event, now))
        .cloned()
        .collect()
}
