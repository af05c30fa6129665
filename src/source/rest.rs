//! Per-datasource interval listing from the coordinator.
//!
//! Used on clusters where `sys.segments` is not queryable. Each datasource is
//! listed separately and the results are flattened.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::client::DruidClient;
use super::{IntervalQuery, SegmentSource};
use crate::timeline::types::parse_timestamp;
use crate::timeline::{DateRange, RawIntervalRow, Stats, TimelineError};

/// Stats for one interval in a `?simple` listing
#[derive(Debug, Deserialize)]
struct IntervalStats {
    #[serde(default)]
    size: f64,
    #[serde(default)]
    count: f64,
    #[serde(default)]
    rows: f64,
}

/// Split a Druid interval string like `2024-01-01T00:00:00.000Z/2024-01-02T00:00:00.000Z`
pub fn parse_interval(interval: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), TimelineError> {
    let (start, end) = interval
        .split_once('/')
        .ok_or_else(|| TimelineError::InvalidData(format!("Malformed interval: {:?}", interval)))?;
    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}

fn listing_to_rows(
    datasource: &str,
    listing: HashMap<String, IntervalStats>,
    range: &DateRange,
) -> Result<Vec<RawIntervalRow>, TimelineError> {
    let mut rows = Vec::with_capacity(listing.len());
    for (interval, stats) in listing {
        let (start, end) = parse_interval(&interval)?;
        if range.start <= start && end < range.end {
            rows.push(RawIntervalRow {
                start,
                end,
                datasource: Some(datasource.to_string()),
                stats: Stats::new(stats.count, stats.size, stats.rows),
            });
        }
    }
    Ok(rows)
}

/// Fetches interval stats datasource by datasource
pub struct RestSource {
    client: DruidClient,
}

impl RestSource {
    pub fn new(client: DruidClient) -> Self {
        Self { client }
    }

    fn datasources(&self, query: &IntervalQuery) -> Result<Vec<String>, TimelineError> {
        match &query.datasource {
            Some(ds) => Ok(vec![ds.clone()]),
            None => self.client.get_json("/druid/coordinator/v1/datasources"),
        }
    }
}

impl SegmentSource for RestSource {
    fn fetch_intervals(&self, query: &IntervalQuery) -> Result<Vec<RawIntervalRow>, TimelineError> {
        let mut rows = Vec::new();
        for datasource in self.datasources(query)? {
            let path = format!(
                "/druid/coordinator/v1/datasources/{}/intervals?simple",
                urlencoding::encode(&datasource)
            );
            let listing: HashMap<String, IntervalStats> = self.client.get_json(&path)?;
            rows.extend(listing_to_rows(&datasource, listing, &query.range)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_parse_interval() {
        let (start, end) = parse_interval("2024-01-01T00:00:00.000Z/2024-01-02T00:00:00.000Z").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());

        assert!(matches!(
            parse_interval("2024-01-01T00:00:00.000Z"),
            Err(TimelineError::InvalidData(_))
        ));
        assert!(matches!(
            parse_interval("2024-01-01/tomorrow"),
            Err(TimelineError::InvalidData(_))
        ));
    }

    #[test]
    fn test_listing_filters_to_range() {
        let json = r#"{
            "2024-01-03T00:00:00.000Z/2024-01-04T00:00:00.000Z": {"size": 100, "count": 2, "rows": 10},
            "2023-12-31T00:00:00.000Z/2024-01-01T00:00:00.000Z": {"size": 1, "count": 1, "rows": 1},
            "2024-01-31T00:00:00.000Z/2024-02-01T00:00:00.000Z": {"size": 1, "count": 1}
        }"#;
        let listing: HashMap<String, IntervalStats> = serde_json::from_str(json).unwrap();
        let rows = listing_to_rows("wiki", listing, &jan()).unwrap();

        // Only the interval strictly inside the range survives
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].datasource.as_deref(), Some("wiki"));
        assert_eq!(rows[0].stats, Stats::new(2.0, 100.0, 10.0));
    }

    #[test]
    fn test_listing_rejects_bad_interval_keys() {
        let json = r#"{"garbage": {"size": 1, "count": 1, "rows": 1}}"#;
        let listing: HashMap<String, IntervalStats> = serde_json::from_str(json).unwrap();
        assert!(listing_to_rows("wiki", listing, &jan()).is_err());
    }
}
