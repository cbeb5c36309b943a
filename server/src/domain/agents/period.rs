//! Aggregation windows and the period selectors exposed over the API

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Trailing window selectable by API callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PeriodSelector {
    #[serde(rename = "24h")]
    Last24Hours,
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl PeriodSelector {
    pub const ALL: [PeriodSelector; 3] = [Self::Last24Hours, Self::Last7Days, Self::Last30Days];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
        }
    }

    /// Resolve the selector against `now`.
    ///
    /// `24h` is a rolling window and therefore touches two calendar days.
    /// Day-based selectors start at midnight UTC so each bucket is a full day.
    pub fn resolve(self, now: DateTime<Utc>) -> AggregationPeriod {
        let start = match self {
            Self::Last24Hours => now - Duration::hours(24),
            Self::Last7Days => start_of_day(now.date_naive() - Days::new(6)),
            Self::Last30Days => start_of_day(now.date_naive() - Days::new(29)),
        };
        AggregationPeriod::between(start, now)
    }
}

impl fmt::Display for PeriodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Invalid period '{}'. Valid options: 24h, 7d, 30d", s))
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Time window that sizes and aligns the per-day histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Number of calendar-day buckets, oldest first, starting at `start`'s UTC date
    pub day_count: i64,
}

impl AggregationPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, day_count: i64) -> Self {
        Self {
            start,
            end,
            day_count,
        }
    }

    /// Period covering every UTC calendar day touched by `[start, end]`
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let day_count = (end.date_naive() - start.date_naive()).num_days() + 1;
        Self::new(start, end, day_count)
    }

    /// Bucket index for a timestamp, `None` when it falls outside every bucket
    pub fn day_index(&self, ts: DateTime<Utc>) -> Option<usize> {
        let offset = (ts.date_naive() - self.start.date_naive()).num_days();
        if (0..self.day_count).contains(&offset) {
            usize::try_from(offset).ok()
        } else {
            None
        }
    }
}
