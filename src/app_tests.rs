use super::*;
use crate::timeline::{Margin, Stats};
use chrono::TimeZone;

fn day(m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap()
}

#[test]
fn week_preset_ends_on_next_day_boundary() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap();
    let range = RangePreset::Week1.range(now);
    assert_eq!(range, DateRange::new(day(3, 4), day(3, 11)));
    assert_eq!(RangePreset::Week1.months(), None);
}

#[test]
fn month_presets_match_last_months() {
    let now = Utc.with_ymd_and_hms(2024, 5, 15, 8, 0, 0).unwrap();
    assert_eq!(RangePreset::Month3.range(now), DateRange::new(day(2, 16), day(5, 16)));
    assert_eq!(
        RangePreset::Year1.range(now),
        DateRange::last_months(now, 12)
    );
}

#[test]
fn time_ticks_span_the_plot() {
    let time = TimeScale::new(DateRange::new(day(1, 1), day(1, 31)), 300.0);
    let ticks = time_ticks(&time, 100.0);
    assert_eq!(ticks.len(), 4);
    assert_eq!(ticks[0], (0.0, day(1, 1)));
    assert_eq!(ticks[3], (300.0, day(1, 31)));

    let empty = TimeScale::new(DateRange::new(day(1, 1), day(1, 31)), 0.0);
    assert!(time_ticks(&empty, 100.0).is_empty());

    // Narrower than one spacing still gets both ends
    let narrow = TimeScale::new(DateRange::new(day(1, 1), day(1, 31)), 40.0);
    assert_eq!(time_ticks(&narrow, 100.0).len(), 2);
}

#[test]
fn stat_ticks_run_bottom_to_top() {
    let margin = Margin {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };
    let bar = RenderableBar {
        start: day(1, 1),
        end: day(1, 2),
        datasource: None,
        duration_seconds: 86_400.0,
        value: Stats::new(8.0, 8.0, 8.0),
        offset: Stats::default(),
    };
    let scales = ChartScales::new(
        &[bar],
        DateRange::new(day(1, 1), day(1, 3)),
        Stage { width: 200.0, height: 100.0 },
        &margin,
        StatKind::Count,
    );

    let ticks = stat_ticks(&scales, 4);
    assert_eq!(ticks.first(), Some(&(100.0, 0.0)));
    assert_eq!(ticks.last(), Some(&(0.0, 8.0)));
    assert_eq!(ticks[2], (50.0, 4.0));
}

#[test]
fn tooltip_shows_totals_and_rates() {
    let bar = RenderableBar {
        start: day(1, 1),
        end: day(1, 2),
        datasource: Some("wikipedia".into()),
        duration_seconds: 86_400.0,
        value: Stats::new(12.0 / 86_400.0, 1_500_000.0 / 86_400.0, 120.0 / 86_400.0),
        offset: Stats::default(),
    };
    let lines = tooltip_lines(&bar);
    assert_eq!(lines[0], "wikipedia");
    assert_eq!(lines[1], "2024-01-01 00:00 → 2024-01-02 00:00");
    assert!(lines[2].starts_with("Segment count: 12 ("));
    assert!(lines[3].starts_with("Total size: 1.50 MB ("));
    assert!(lines[4].starts_with("Total rows: 120 ("));
}

#[test]
fn pointer_hub_tracks_subscription() {
    let mut hub = EguiPointerHub::default();
    assert!(!hub.is_subscribed());
    hub.subscribe();
    assert!(hub.is_subscribed());
    hub.unsubscribe();
    assert!(!hub.is_subscribed());
}
