//! Core data types for the segment timeline.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{AddAssign, Index, IndexMut};

use super::bucket::{ceil_to_duration, BucketDuration};
use super::error::TimelineError;

/// Statistic tracked per interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Count,
    #[default]
    Size,
    Rows,
}

/// Display metadata for a statistic
pub struct StatMeta {
    pub label: &'static str,
    pub format_value: fn(f64) -> String,
    pub format_rate: fn(f64) -> String,
}

const STAT_META: [StatMeta; 3] = [
    StatMeta {
        label: "Segment count",
        format_value: format_integer,
        format_rate: format_integer_rate,
    },
    StatMeta {
        label: "Total size",
        format_value: format_bytes,
        format_rate: format_bytes_rate,
    },
    StatMeta {
        label: "Total rows",
        format_value: format_integer,
        format_rate: format_integer_rate,
    },
];

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Count, StatKind::Size, StatKind::Rows];

    pub fn meta(&self) -> &'static StatMeta {
        match self {
            StatKind::Count => &STAT_META[0],
            StatKind::Size => &STAT_META[1],
            StatKind::Rows => &STAT_META[2],
        }
    }

    pub fn label(&self) -> &'static str {
        self.meta().label
    }
}

/// The three statistics of an interval, indexable by [`StatKind`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub count: f64,
    pub size: f64,
    pub rows: f64,
}

impl Stats {
    pub fn new(count: f64, size: f64, rows: f64) -> Self {
        Self { count, size, rows }
    }

    /// Divide every statistic by `divisor`
    pub fn per(&self, divisor: f64) -> Self {
        Self {
            count: self.count / divisor,
            size: self.size / divisor,
            rows: self.rows / divisor,
        }
    }
}

impl Index<StatKind> for Stats {
    type Output = f64;

    fn index(&self, kind: StatKind) -> &f64 {
        match kind {
            StatKind::Count => &self.count,
            StatKind::Size => &self.size,
            StatKind::Rows => &self.rows,
        }
    }
}

impl IndexMut<StatKind> for Stats {
    fn index_mut(&mut self, kind: StatKind) -> &mut f64 {
        match kind {
            StatKind::Count => &mut self.count,
            StatKind::Size => &mut self.size,
            StatKind::Rows => &mut self.rows,
        }
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        self.count += other.count;
        self.size += other.size;
        self.rows += other.rows;
    }
}

/// One interval record as returned by the query layer
#[derive(Debug, Clone, PartialEq)]
pub struct RawIntervalRow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub datasource: Option<String>,
    pub stats: Stats,
}

/// Absolute (UTC) date range, always `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Build a range, swapping the ends if they arrive out of order
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// The `months` months ending at the next day boundary after `now`
    pub fn last_months(now: DateTime<Utc>, months: u32) -> Self {
        let end = ceil_to_duration(now, BucketDuration::Day);
        let start = end.checked_sub_months(Months::new(months)).unwrap_or(end);
        Self::new(start, end)
    }

    pub fn shifted(&self, offset_ms: i64) -> Self {
        let offset = Duration::milliseconds(offset_ms);
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    pub fn duration_millis(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }
}

/// Parse an ISO 8601 timestamp as returned by Druid
pub fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, TimelineError> {
    Ok(DateTime::parse_from_rfc3339(ts.trim())?.with_timezone(&Utc))
}

/// Format as e.g. `2024-01-01T00:00:00.000Z`
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn format_integer(v: f64) -> String {
    let rounded = v.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_integer_rate(v: f64) -> String {
    if v.abs() >= 10.0 {
        format!("{}/s", format_integer(v))
    } else {
        format!("{:.3}/s", v)
    }
}

fn format_bytes(v: f64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut value = v;
    let mut unit = 0;
    while value.abs() >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", value.round() as i64)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

fn format_bytes_rate(v: f64) -> String {
    format!("{}/s", format_bytes(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stats_index_matches_fields() {
        let mut stats = Stats::new(1.0, 2.0, 3.0);
        assert_eq!(stats[StatKind::Count], 1.0);
        assert_eq!(stats[StatKind::Size], 2.0);
        assert_eq!(stats[StatKind::Rows], 3.0);

        stats[StatKind::Rows] += 7.0;
        assert_eq!(stats.rows, 10.0);
    }

    #[test]
    fn test_date_range_orders_ends() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let range = DateRange::new(a, b);
        assert_eq!(range.start, b);
        assert_eq!(range.end, a);
    }

    #[test]
    fn test_last_months_ends_on_day_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 13, 45, 0).unwrap();
        let range = DateRange::last_months(now, 3);
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 5, 16, 0, 0, 0).unwrap());
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 2, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp() {
        let t = parse_timestamp("2024-01-01T12:00:00.000Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, TimelineError::InvalidData(_)));
    }

    #[test]
    fn test_formatters() {
        assert_eq!((StatKind::Count.meta().format_value)(1234567.0), "1,234,567");
        assert_eq!((StatKind::Size.meta().format_value)(999.0), "999 B");
        assert_eq!((StatKind::Size.meta().format_value)(1_500_000.0), "1.50 MB");
        assert_eq!((StatKind::Rows.meta().format_rate)(0.5), "0.500/s");
    }
}
