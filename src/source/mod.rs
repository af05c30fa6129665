//! Segment sources: the two ways interval stats are pulled from a Druid cluster.

mod client;
mod rest;
mod sql;

pub use client::{DruidClient, DEFAULT_BASE_URL};
pub use rest::RestSource;
pub use sql::SqlSource;

use crate::timeline::{DateRange, RawIntervalRow, TimelineError};

/// What to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalQuery {
    pub range: DateRange,
    pub break_by_datasource: bool,
    /// Restrict to one datasource (drill-down)
    pub datasource: Option<String>,
}

/// Anything that can produce raw interval rows for a query
pub trait SegmentSource: Send {
    fn fetch_intervals(&self, query: &IntervalQuery) -> Result<Vec<RawIntervalRow>, TimelineError>;
}

/// Pick the retrieval strategy for the cluster's capabilities
pub fn source_for(client: DruidClient, use_sql: bool) -> Box<dyn SegmentSource> {
    if use_sql {
        Box::new(SqlSource::new(client))
    } else {
        Box::new(RestSource::new(client))
    }
}
