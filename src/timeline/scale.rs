//! Time → pixel and stat → pixel mappings for the chart.
//!
//! Everything here is a plain value rebuilt from the current bars, date range and
//! stage; nothing is cached across resizes. Pixel coordinates are relative to the
//! inner plot area (margins already removed), with y growing downwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::stack::RenderableBar;
use super::types::{DateRange, StatKind};

/// Size of the whole chart area
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stage {
    pub width: f64,
    pub height: f64,
}

/// Space reserved around the plot for axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 10.0,
            bottom: 25.0,
            left: 70.0,
        }
    }
}

impl Stage {
    pub fn inner_width(&self, margin: &Margin) -> f64 {
        (self.width - margin.left - margin.right).max(0.0)
    }

    pub fn inner_height(&self, margin: &Margin) -> f64 {
        (self.height - margin.top - margin.bottom).max(0.0)
    }
}

/// Linear map from a date range onto `[0, width]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: DateRange,
    width: f64,
}

impl TimeScale {
    pub fn new(domain: DateRange, width: f64) -> Self {
        Self {
            domain,
            width: width.max(0.0),
        }
    }

    pub fn domain(&self) -> DateRange {
        self.domain
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn apply(&self, t: DateTime<Utc>) -> f64 {
        let span = self.domain.duration_millis() as f64;
        if span <= 0.0 {
            return 0.0;
        }
        (t - self.domain.start).num_milliseconds() as f64 / span * self.width
    }

    pub fn invert(&self, x: f64) -> DateTime<Utc> {
        if self.width <= 0.0 {
            return self.domain.start;
        }
        let span = self.domain.duration_millis() as f64;
        let offset = (x / self.width * span).round() as i64;
        self.domain.start + Duration::milliseconds(offset)
    }

    /// The same scale with its domain moved by `offset_ms`
    pub fn shifted(&self, offset_ms: i64) -> Self {
        Self {
            domain: self.domain.shifted(offset_ms),
            width: self.width,
        }
    }
}

/// Linear map from `[0, max]` onto `[height, 0]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatScale {
    max: f64,
    height: f64,
}

impl StatScale {
    /// A non-positive `max` falls back to a `[0, 1]` domain
    pub fn new(max: f64, height: f64) -> Self {
        let max = if max > 0.0 && max.is_finite() { max } else { 1.0 };
        Self {
            max,
            height: height.max(0.0),
        }
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn apply(&self, v: f64) -> f64 {
        self.height - v / self.max * self.height
    }

    pub fn invert(&self, y: f64) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }
        (self.height - y) / self.height * self.max
    }
}

/// Inner-plot rectangle of a bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl PlotRect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// Both scales for the current chart state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScales {
    pub time: TimeScale,
    pub stat: StatScale,
    pub shown_stat: StatKind,
    pub inner_width: f64,
    pub inner_height: f64,
}

impl ChartScales {
    pub fn new(
        bars: &[RenderableBar],
        range: DateRange,
        stage: Stage,
        margin: &Margin,
        shown_stat: StatKind,
    ) -> Self {
        let inner_width = stage.inner_width(margin);
        let inner_height = stage.inner_height(margin);
        let max_stacked = bars
            .iter()
            .map(|b| b.top(shown_stat))
            .fold(0.0_f64, f64::max);

        Self {
            time: TimeScale::new(range, inner_width),
            stat: StatScale::new(max_stacked, inner_height),
            shown_stat,
            inner_width,
            inner_height,
        }
    }

    /// Geometry of `bar` under `time` (which may be a shifted copy of `self.time`)
    pub fn bar_rect(&self, bar: &RenderableBar, time: &TimeScale) -> PlotRect {
        PlotRect {
            left: time.apply(bar.start),
            right: time.apply(bar.end),
            top: self.stat.apply(bar.top(self.shown_stat)),
            bottom: self.stat.apply(bar.offset[self.shown_stat]),
        }
    }

    /// Index of the topmost bar under `(x, y)`
    pub fn bar_at(&self, bars: &[RenderableBar], x: f64, y: f64) -> Option<usize> {
        if x < 0.0 || y < 0.0 || x > self.inner_width || y > self.inner_height {
            return None;
        }
        bars.iter()
            .enumerate()
            .rev()
            .find(|(_, bar)| self.bar_rect(bar, &self.time).contains(x, y))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::types::Stats;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn bar(start: u32, end: u32, value: f64, offset: f64) -> RenderableBar {
        RenderableBar {
            start: day(start),
            end: day(end),
            datasource: None,
            duration_seconds: (end - start) as f64 * 86400.0,
            value: Stats::new(value, value, value),
            offset: Stats::new(offset, offset, offset),
        }
    }

    fn stage() -> (Stage, Margin) {
        let margin = Margin {
            top: 10.0,
            right: 10.0,
            bottom: 20.0,
            left: 40.0,
        };
        (Stage { width: 350.0, height: 130.0 }, margin)
    }

    #[test]
    fn test_inner_size_subtracts_margins() {
        let (stage, margin) = stage();
        assert_eq!(stage.inner_width(&margin), 300.0);
        assert_eq!(stage.inner_height(&margin), 100.0);

        let tiny = Stage { width: 20.0, height: 5.0 };
        assert_eq!(tiny.inner_width(&margin), 0.0);
        assert_eq!(tiny.inner_height(&margin), 0.0);
    }

    #[test]
    fn test_time_scale_is_monotonic_and_invertible() {
        let scale = TimeScale::new(DateRange::new(day(1), day(31)), 300.0);
        assert_eq!(scale.apply(day(1)), 0.0);
        assert_eq!(scale.apply(day(31)), 300.0);

        let mut last = f64::MIN;
        for d in 1..=31 {
            let x = scale.apply(day(d));
            assert!(x >= last);
            last = x;
            assert_eq!(scale.invert(x), day(d));
        }
    }

    #[test]
    fn test_shifted_time_scale_moves_domain() {
        let scale = TimeScale::new(DateRange::new(day(1), day(11)), 100.0);
        let shifted = scale.shifted(86_400_000);
        assert_eq!(shifted.domain(), DateRange::new(day(2), day(12)));
        assert_eq!(shifted.apply(day(2)), 0.0);
    }

    #[test]
    fn test_stat_scale_inverse_recovers_value() {
        let scale = StatScale::new(37.5, 100.0);
        assert_eq!(scale.apply(0.0), 100.0);
        assert_eq!(scale.apply(37.5), 0.0);
        for v in [0.0, 0.1, 3.3, 12.0, 37.5] {
            assert!((scale.invert(scale.apply(v)) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_bars_use_unit_domain() {
        let (stage, margin) = stage();
        let scales = ChartScales::new(&[], DateRange::new(day(1), day(2)), stage, &margin, StatKind::Size);
        assert_eq!(scales.stat.max(), 1.0);
    }

    #[test]
    fn test_max_stacked_value_sets_domain() {
        let (stage, margin) = stage();
        let bars = vec![bar(1, 3, 4.0, 0.0), bar(2, 3, 2.0, 4.0)];
        let scales = ChartScales::new(&bars, DateRange::new(day(1), day(4)), stage, &margin, StatKind::Rows);
        assert_eq!(scales.stat.max(), 6.0);

        let rect = scales.bar_rect(&bars[1], &scales.time);
        assert!((rect.left - 100.0).abs() < 1e-9);
        assert!((rect.right - 200.0).abs() < 1e-9);
        assert!((rect.top - 0.0).abs() < 1e-9);
        assert!((rect.bottom - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bar_at_prefers_topmost() {
        let (stage, margin) = stage();
        let bars = vec![bar(1, 3, 4.0, 0.0), bar(2, 3, 2.0, 4.0)];
        let scales = ChartScales::new(&bars, DateRange::new(day(1), day(4)), stage, &margin, StatKind::Count);

        assert_eq!(scales.bar_at(&bars, 150.0, 10.0), Some(1));
        assert_eq!(scales.bar_at(&bars, 150.0, 90.0), Some(0));
        assert_eq!(scales.bar_at(&bars, 50.0, 10.0), None);
        assert_eq!(scales.bar_at(&bars, 250.0, 90.0), None);
        assert_eq!(scales.bar_at(&bars, -1.0, 90.0), None);
    }
}
