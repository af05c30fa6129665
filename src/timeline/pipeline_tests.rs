use super::*;
use chrono::{DateTime, TimeZone, Utc};

fn ts(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
}

fn raw(start: DateTime<Utc>, end: DateTime<Utc>, ds: &str, count: f64, size: f64, rows: f64) -> RawIntervalRow {
    RawIntervalRow {
        start,
        end,
        datasource: Some(ds.into()),
        stats: Stats::new(count, size, rows),
    }
}

#[test]
fn day_buckets_merge_before_stacking() {
    let rows = vec![
        raw(ts(1, 0), ts(2, 0), "wiki", 10.0, 1000.0, 100.0),
        raw(ts(1, 12), ts(1, 18), "wiki", 2.0, 200.0, 20.0),
    ];

    let bars = build_bars(&rows, BucketDuration::Day, false).unwrap();
    assert_eq!(bars.len(), 1);

    let bar = &bars[0];
    assert_eq!(bar.start, ts(1, 0));
    assert_eq!(bar.end, ts(2, 0));
    assert_eq!(bar.duration_seconds, 86400.0);
    assert_eq!(bar.offset, Stats::default());
    assert!((bar.total(StatKind::Count) - 12.0).abs() < 1e-9);
    assert!((bar.total(StatKind::Size) - 1200.0).abs() < 1e-9);
    assert!((bar.total(StatKind::Rows) - 120.0).abs() < 1e-9);
}

#[test]
fn hour_buckets_keep_rows_apart_and_stack() {
    let rows = vec![
        raw(ts(1, 0), ts(2, 0), "wiki", 10.0, 1000.0, 100.0),
        raw(ts(1, 12), ts(1, 18), "wiki", 2.0, 200.0, 20.0),
    ];

    let bars = build_bars(&rows, BucketDuration::Hour, false).unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].duration_seconds, 86400.0);
    assert_eq!(bars[0].offset, Stats::default());
    assert_eq!(bars[1].duration_seconds, 6.0 * 3600.0);
    assert_eq!(bars[1].offset, bars[0].value);
}

#[test]
fn scales_follow_stacked_bars() {
    let rows = vec![
        raw(ts(1, 0), ts(3, 0), "a", 0.0, 172_800.0, 0.0),
        raw(ts(2, 0), ts(3, 0), "b", 0.0, 86_400.0, 0.0),
    ];
    let bars = build_bars(&rows, BucketDuration::Day, true).unwrap();
    let scales = ChartScales::new(
        &bars,
        DateRange::new(ts(1, 0), ts(5, 0)),
        Stage { width: 400.0, height: 100.0 },
        &Margin { top: 0.0, right: 0.0, bottom: 0.0, left: 0.0 },
        StatKind::Size,
    );

    // 1 B/s for the wide bar plus 1 B/s stacked on top of it
    assert!((scales.stat.max() - 2.0).abs() < 1e-9);
    assert_eq!(scales.bar_at(&bars, 150.0, 10.0), Some(1));
    assert_eq!(scales.bar_at(&bars, 50.0, 10.0), None);
    assert_eq!(scales.bar_at(&bars, 50.0, 90.0), Some(0));
}

#[test]
fn invalid_rows_surface_as_errors() {
    let instant = ts(1, 0);
    let rows = vec![raw(instant, instant, "wiki", 1.0, 1.0, 1.0)];
    assert!(matches!(
        build_bars(&rows, BucketDuration::Day, false),
        Err(TimelineError::InvalidData(_))
    ));
    assert_eq!(LoadState::from_bars(build_bars(&[], BucketDuration::Day, false).unwrap()), LoadState::NoData);
}
