//! Bucketing and grouping of raw interval rows.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::bucket::{ceil_to_duration, floor_to_duration, BucketDuration};
use super::error::TimelineError;
use super::types::{format_timestamp, RawIntervalRow, Stats};

/// How raw rows are grouped into bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub duration: BucketDuration,
    pub break_by_datasource: bool,
    /// Convert summed stats into per-second rates
    pub normalize: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            duration: BucketDuration::Day,
            break_by_datasource: false,
            normalize: true,
        }
    }
}

/// A raw row snapped to the bucket grid
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedRow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub datasource: Option<String>,
    pub duration_seconds: f64,
    pub stats: Stats,
}

/// One bar's worth of data: a unique (start, end, datasource) group
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub datasource: Option<String>,
    pub duration_seconds: f64,
    /// Summed stats, or per-second rates once normalized
    pub stats: Stats,
}

impl AggregatedRow {
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// Same row with every stat divided by the bucket length
    pub fn to_rate(&self) -> AggregatedRow {
        AggregatedRow {
            stats: self.stats.per(self.duration_seconds),
            ..self.clone()
        }
    }
}

/// Snap a row's boundaries to `duration`, rejecting rows that collapse to nothing
pub fn bucket_row(row: &RawIntervalRow, duration: BucketDuration) -> Result<BucketedRow, TimelineError> {
    let start = floor_to_duration(row.start, duration);
    let end = ceil_to_duration(row.end, duration);
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return Err(TimelineError::InvalidData(format!(
            "Interval {}/{} has no duration after bucketing to {}",
            format_timestamp(row.start),
            format_timestamp(row.end),
            duration.label().to_lowercase()
        )));
    }

    Ok(BucketedRow {
        start,
        end,
        datasource: row.datasource.clone(),
        duration_seconds: millis as f64 / 1000.0,
        stats: row.stats,
    })
}

fn group_key(row: &BucketedRow, break_by_datasource: bool) -> String {
    let datasource = if break_by_datasource {
        row.datasource.as_deref().unwrap_or("")
    } else {
        ""
    };
    format!(
        "{}/{}/{}",
        format_timestamp(row.start),
        format_timestamp(row.end),
        datasource
    )
}

/// Group rows by bucket and datasource, summing their stats.
///
/// Groups come back in order of first appearance. Any row whose bucketed
/// interval is empty fails the whole call.
pub fn aggregate_rows(
    rows: &[RawIntervalRow],
    options: &AggregateOptions,
) -> Result<Vec<AggregatedRow>, TimelineError> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<AggregatedRow> = Vec::new();

    for row in rows {
        let bucketed = bucket_row(row, options.duration)?;
        let key = group_key(&bucketed, options.break_by_datasource);

        match index.get(&key) {
            Some(&i) => groups[i].stats += bucketed.stats,
            None => {
                index.insert(key, groups.len());
                groups.push(AggregatedRow {
                    start: bucketed.start,
                    end: bucketed.end,
                    datasource: if options.break_by_datasource {
                        bucketed.datasource
                    } else {
                        None
                    },
                    duration_seconds: bucketed.duration_seconds,
                    stats: bucketed.stats,
                });
            }
        }
    }

    tracing::debug!(
        "Aggregated {} rows into {} groups ({:?})",
        rows.len(),
        groups.len(),
        options.duration
    );

    if options.normalize {
        Ok(groups.iter().map(AggregatedRow::to_rate).collect())
    } else {
        Ok(groups)
    }
}
