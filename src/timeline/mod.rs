//! Segment timeline core: bucketing, aggregation, stacking, scales and gestures.
//!
//! Nothing in here performs I/O or paints; the host feeds raw interval rows in
//! and pointer events, and gets bars, scales and range-change events back.

pub mod aggregate;
pub mod bucket;
pub mod error;
pub mod fetch;
pub mod gesture;
pub mod interval_tree;
pub mod scale;
pub mod stack;
pub mod types;

#[cfg(test)]
mod pipeline_tests;

pub use aggregate::{aggregate_rows, AggregateOptions};
pub use bucket::BucketDuration;
pub use error::TimelineError;
pub use fetch::{FetchSlot, LoadState, QueryKey, RequestToken};
pub use gesture::{GestureController, GestureEvent, HoveredBar, PointerListeners, PointerPos};
pub use scale::{ChartScales, Margin, Stage};
pub use stack::{stack_bars, RenderableBar};
pub use types::{DateRange, RawIntervalRow, StatKind, Stats};

/// Raw rows to stacked rate-form bars
pub fn build_bars(
    rows: &[RawIntervalRow],
    duration: BucketDuration,
    break_by_datasource: bool,
) -> Result<Vec<RenderableBar>, TimelineError> {
    let options = AggregateOptions {
        duration,
        break_by_datasource,
        normalize: true,
    };
    let aggregated = aggregate_rows(rows, &options)?;
    Ok(stack_bars(aggregated))
}
