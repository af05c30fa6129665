//! Snapping timestamps to hour/day/month/year boundaries.
//!
//! Raw interval boundaries coming back from the cluster are usually finer than
//! the chart's grid, so they are floored/ceiled to a common bucket before grouping.
//! All arithmetic happens in UTC.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::TimelineError;

/// Granularity that interval boundaries are trimmed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BucketDuration {
    Hour,
    #[default]
    Day,
    Month,
    Year,
}

impl BucketDuration {
    pub const ALL: [BucketDuration; 4] = [
        BucketDuration::Hour,
        BucketDuration::Day,
        BucketDuration::Month,
        BucketDuration::Year,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BucketDuration::Hour => "Hour",
            BucketDuration::Day => "Day",
            BucketDuration::Month => "Month",
            BucketDuration::Year => "Year",
        }
    }
}

impl FromStr for BucketDuration {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "pt1h" => Ok(BucketDuration::Hour),
            "day" | "p1d" => Ok(BucketDuration::Day),
            "month" | "p1m" => Ok(BucketDuration::Month),
            "year" | "p1y" => Ok(BucketDuration::Year),
            other => Err(TimelineError::InvalidArgument(format!(
                "Unsupported bucket duration: {:?}",
                other
            ))),
        }
    }
}

/// Truncate `t` to the start of its containing unit
pub fn floor_to_duration(t: DateTime<Utc>, d: BucketDuration) -> DateTime<Utc> {
    let midnight = t.date_naive().and_time(NaiveTime::MIN).and_utc();
    match d {
        BucketDuration::Hour => midnight + Duration::hours(t.hour() as i64),
        BucketDuration::Day => midnight,
        BucketDuration::Month => midnight - Days::new(t.day0() as u64),
        BucketDuration::Year => midnight - Days::new(t.ordinal0() as u64),
    }
}

/// Round `t` up to the next unit boundary; aligned inputs come back unchanged
pub fn ceil_to_duration(t: DateTime<Utc>, d: BucketDuration) -> DateTime<Utc> {
    let floor = floor_to_duration(t, d);
    if floor == t {
        return t;
    }
    match d {
        BucketDuration::Hour => floor + Duration::hours(1),
        BucketDuration::Day => floor + Days::new(1),
        BucketDuration::Month => floor.checked_add_months(Months::new(1)).unwrap_or(floor),
        BucketDuration::Year => floor.checked_add_months(Months::new(12)).unwrap_or(floor),
    }
}
