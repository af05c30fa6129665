//! Aggregated interval query against `sys.segments`.

use serde::{Deserialize, Serialize};

use super::client::DruidClient;
use super::{IntervalQuery, SegmentSource};
use crate::timeline::types::{format_timestamp, parse_timestamp};
use crate::timeline::{RawIntervalRow, Stats, TimelineError};

#[derive(Debug, Serialize)]
struct SqlRequest<'a> {
    query: &'a str,
    #[serde(rename = "resultFormat")]
    result_format: &'a str,
}

/// One result row; SUMs over empty groups may come back null
#[derive(Debug, Deserialize)]
struct SqlIntervalRow {
    start: String,
    end: String,
    #[serde(default)]
    datasource: Option<String>,
    #[serde(default)]
    count: Option<f64>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    rows: Option<f64>,
}

impl SqlIntervalRow {
    fn into_raw(self) -> Result<RawIntervalRow, TimelineError> {
        Ok(RawIntervalRow {
            start: parse_timestamp(&self.start)?,
            end: parse_timestamp(&self.end)?,
            datasource: self.datasource,
            stats: Stats::new(
                self.count.unwrap_or(0.0),
                self.size.unwrap_or(0.0),
                self.rows.unwrap_or(0.0),
            ),
        })
    }
}

fn sql_string_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Build the segment query for `query`
pub fn build_query(query: &IntervalQuery) -> String {
    let with_datasource = query.break_by_datasource || query.datasource.is_some();
    let datasource_column = if with_datasource { "\"datasource\", " } else { "" };
    let datasource_filter = query
        .datasource
        .as_deref()
        .map(|ds| format!(" AND \"datasource\" = {}", sql_string_literal(ds)))
        .unwrap_or_default();
    let group_by = if with_datasource { "1, 2, 3" } else { "1, 2" };

    format!(
        r#"SELECT
  "start", "end", {datasource_column}
  COUNT(*) AS "count",
  SUM("size") AS "size",
  SUM("num_rows") AS "rows"
FROM sys.segments
WHERE {start} <= "start" AND "end" <= {end} AND is_published = 1 AND is_overshadowed = 0{datasource_filter}
GROUP BY {group_by}"#,
        start = sql_string_literal(&format_timestamp(query.range.start)),
        end = sql_string_literal(&format_timestamp(query.range.end)),
    )
}

/// Fetches pre-aggregated rows with one SQL query
pub struct SqlSource {
    client: DruidClient,
}

impl SqlSource {
    pub fn new(client: DruidClient) -> Self {
        Self { client }
    }
}

impl SegmentSource for SqlSource {
    fn fetch_intervals(&self, query: &IntervalQuery) -> Result<Vec<RawIntervalRow>, TimelineError> {
        let sql = build_query(query);
        let rows: Vec<SqlIntervalRow> = self.client.post_json(
            "/druid/v2/sql",
            &SqlRequest {
                query: &sql,
                result_format: "object",
            },
        )?;
        rows.into_iter().map(SqlIntervalRow::into_raw).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::DateRange;
    use chrono::{TimeZone, Utc};

    fn query(break_by_datasource: bool, datasource: Option<&str>) -> IntervalQuery {
        IntervalQuery {
            range: DateRange::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            ),
            break_by_datasource,
            datasource: datasource.map(str::to_string),
        }
    }

    #[test]
    fn test_query_without_datasource() {
        let sql = build_query(&query(false, None));
        assert!(sql.contains("'2024-01-01T00:00:00.000Z' <= \"start\""));
        assert!(sql.contains("\"end\" <= '2024-04-01T00:00:00.000Z'"));
        assert!(sql.contains("is_published = 1 AND is_overshadowed = 0"));
        assert!(!sql.contains("\"datasource\""));
        assert!(sql.ends_with("GROUP BY 1, 2"));
    }

    #[test]
    fn test_query_breaks_by_datasource() {
        let sql = build_query(&query(true, None));
        assert!(sql.contains("\"start\", \"end\", \"datasource\","));
        assert!(sql.ends_with("GROUP BY 1, 2, 3"));
    }

    #[test]
    fn test_drill_down_filter_is_escaped() {
        let sql = build_query(&query(false, Some("bob's data")));
        assert!(sql.contains("AND \"datasource\" = 'bob''s data'"));
        assert!(sql.ends_with("GROUP BY 1, 2, 3"));
    }

    #[test]
    fn test_result_rows_convert() {
        let json = r#"[
            {"start":"2024-01-01T00:00:00.000Z","end":"2024-01-02T00:00:00.000Z","datasource":"wiki","count":3,"size":1024,"rows":null},
            {"start":"2024-01-02T00:00:00.000Z","end":"2024-01-03T00:00:00.000Z","count":1,"size":10,"rows":5}
        ]"#;
        let rows: Vec<SqlIntervalRow> = serde_json::from_str(json).unwrap();
        let raw: Vec<RawIntervalRow> = rows.into_iter().map(|r| r.into_raw().unwrap()).collect();

        assert_eq!(raw[0].datasource.as_deref(), Some("wiki"));
        assert_eq!(raw[0].stats, Stats::new(3.0, 1024.0, 0.0));
        assert_eq!(raw[1].datasource, None);
        assert_eq!(raw[1].start, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_malformed_timestamp_is_invalid_data() {
        let row = SqlIntervalRow {
            start: "not a date".into(),
            end: "2024-01-03T00:00:00.000Z".into(),
            datasource: None,
            count: Some(1.0),
            size: None,
            rows: None,
        };
        assert!(matches!(row.into_raw(), Err(TimelineError::InvalidData(_))));
    }
}
