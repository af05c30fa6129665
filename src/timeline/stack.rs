//! Skyline stacking of aggregated rows into renderable bars.
//!
//! Wider bars are placed first. Each new bar sits on top of every already placed
//! bar whose span covers the instant just after its own start; the interval tree
//! answers that question without a pairwise scan.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::aggregate::AggregatedRow;
use super::interval_tree::IntervalTree;
use super::types::{StatKind, Stats};

/// A bar ready to be drawn: rate-form values plus the stack below it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableBar {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub datasource: Option<String>,
    pub duration_seconds: f64,
    /// Per-second rates
    pub value: Stats,
    /// Sum of the rates of the bars stacked underneath
    pub offset: Stats,
}

impl RenderableBar {
    /// Height of the top edge of this bar for `kind`
    pub fn top(&self, kind: StatKind) -> f64 {
        self.value[kind] + self.offset[kind]
    }

    /// The absolute (non-rate) amount this bar stands for
    pub fn total(&self, kind: StatKind) -> f64 {
        self.value[kind] * self.duration_seconds
    }
}

fn skyline_order(a: &AggregatedRow, b: &AggregatedRow) -> Ordering {
    b.duration_seconds
        .total_cmp(&a.duration_seconds)
        .then_with(|| {
            let a_ds = a.datasource.as_deref().unwrap_or("");
            let b_ds = b.datasource.as_deref().unwrap_or("");
            b_ds.cmp(a_ds)
        })
}

/// Stack rate-form rows. The output is in placement order, which is also the
/// order to draw in.
pub fn stack_bars(mut rows: Vec<AggregatedRow>) -> Vec<RenderableBar> {
    rows.sort_by(skyline_order);

    let mut index: IntervalTree<usize> = IntervalTree::new();
    let mut bars: Vec<RenderableBar> = Vec::with_capacity(rows.len());

    for row in rows {
        let start_ms = row.start_millis();
        let end_ms = row.end_millis();

        // +1ms so bars that merely touch our start are not counted
        let mut offset = Stats::default();
        for &below in index.query_point(start_ms + 1) {
            offset += bars[below].value;
        }

        index.insert(start_ms, end_ms, bars.len());
        bars.push(RenderableBar {
            start: row.start,
            end: row.end,
            datasource: row.datasource,
            duration_seconds: row.duration_seconds,
            value: row.stats,
            offset,
        });
    }

    bars
}
