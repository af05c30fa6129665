//! Main application state and UI.

use crate::settings::Settings;
use crate::source::{source_for, DruidClient, IntervalQuery};
use crate::theme;
use crate::timeline::bucket::ceil_to_duration;
use crate::timeline::gesture::PendingDrag;
use crate::timeline::scale::TimeScale;
use crate::timeline::{
    build_bars, BucketDuration, ChartScales, DateRange, FetchSlot, GestureController, GestureEvent,
    HoveredBar, LoadState, PointerListeners, PointerPos, QueryKey, RawIntervalRow, RenderableBar,
    RequestToken, Stage, StatKind, TimelineError,
};
use chrono::{DateTime, Duration, Utc};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, RichText, Vec2};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

type FetchResult = (RequestToken, Result<Vec<RawIntervalRow>, TimelineError>);

/// Date range presets offered in the sidebar
#[derive(Debug, Clone, Copy, PartialEq)]
enum RangePreset {
    Week1,
    Month1,
    Month3,
    Year1,
}

impl RangePreset {
    const ALL: [RangePreset; 4] = [
        RangePreset::Week1,
        RangePreset::Month1,
        RangePreset::Month3,
        RangePreset::Year1,
    ];

    fn label(&self) -> &'static str {
        match self {
            RangePreset::Week1 => "1 week",
            RangePreset::Month1 => "1 month",
            RangePreset::Month3 => "3 months",
            RangePreset::Year1 => "1 year",
        }
    }

    /// `None` for presets measured in days
    fn months(&self) -> Option<u32> {
        match self {
            RangePreset::Week1 => None,
            RangePreset::Month1 => Some(1),
            RangePreset::Month3 => Some(3),
            RangePreset::Year1 => Some(12),
        }
    }

    fn range(&self, now: DateTime<Utc>) -> DateRange {
        match self.months() {
            Some(months) => DateRange::last_months(now, months),
            None => {
                let end = ceil_to_duration(now, BucketDuration::Day);
                DateRange::new(end - Duration::days(7), end)
            }
        }
    }
}

/// Stands in for document-level pointer handlers: while subscribed, the chart
/// consumes every pointer move/release from the egui context, including those
/// outside its own rect.
#[derive(Debug, Default)]
struct EguiPointerHub {
    subscribed: bool,
}

impl EguiPointerHub {
    fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

impl PointerListeners for EguiPointerHub {
    fn subscribe(&mut self) {
        self.subscribed = true;
        tracing::debug!("Pointer listeners attached");
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
        tracing::debug!("Pointer listeners released");
    }
}

/// Main timeline application
pub struct TimelineApp {
    // Cluster
    client: DruidClient,
    api_connected: bool,
    api_error: Option<String>,
    base_url_input: String,

    // Query state
    range: DateRange,
    datasource: Option<String>,
    fetch_slot: FetchSlot,
    fetch_tx: Sender<FetchResult>,
    fetch_rx: Receiver<FetchResult>,
    /// Rows of the last accepted fetch, rebucketed when the duration changes
    rows: Option<Vec<RawIntervalRow>>,
    load_state: LoadState,

    gesture: GestureController<EguiPointerHub>,

    // Settings persistence
    settings: Settings,
    settings_dirty: bool,
    last_settings_save: Instant,
}

impl TimelineApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load();
        let client = DruidClient::new(&settings.base_url);
        let (fetch_tx, fetch_rx) = mpsc::channel();

        let mut app = Self {
            base_url_input: client.base_url().to_string(),
            client,
            api_connected: false,
            api_error: None,
            range: DateRange::last_months(Utc::now(), settings.range_months),
            datasource: None,
            fetch_slot: FetchSlot::new(),
            fetch_tx,
            fetch_rx,
            rows: None,
            load_state: LoadState::Loading,
            gesture: GestureController::new(EguiPointerHub::default(), settings.drag_threshold_px),
            settings,
            settings_dirty: false,
            last_settings_save: Instant::now(),
        };

        app.check_api();
        app
    }

    fn check_api(&mut self) {
        match self.client.health() {
            Ok(true) => {
                self.api_connected = true;
                self.api_error = None;
            }
            Ok(false) => {
                self.api_connected = false;
                self.api_error = Some("Cluster unhealthy".to_string());
            }
            Err(e) => {
                self.api_connected = false;
                self.api_error = Some(e.to_string());
            }
        }
    }

    /// Point the client at the URL typed in the sidebar
    fn connect(&mut self) {
        self.client = DruidClient::new(self.base_url_input.trim());
        self.base_url_input = self.client.base_url().to_string();
        self.settings.base_url = self.base_url_input.clone();
        self.mark_settings_dirty();
        self.check_api();
        self.fetch_slot.invalidate();
    }

    fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Save settings if dirty and enough time has passed (debounce)
    fn maybe_save_settings(&mut self) {
        if self.settings_dirty && self.last_settings_save.elapsed().as_secs() >= 2 {
            self.settings.save();
            self.settings_dirty = false;
            self.last_settings_save = Instant::now();
        }
    }

    fn query_key(&self) -> QueryKey {
        QueryKey {
            range: self.range,
            break_by_datasource: self.settings.break_by_datasource,
            use_sql: self.settings.use_sql,
            datasource: self.datasource.clone(),
        }
    }

    /// Start a background fetch if the query changed since the last one
    fn maybe_fetch(&mut self) {
        let key = self.query_key();
        if !self.fetch_slot.needs_fetch(&key) {
            return;
        }

        let query = IntervalQuery {
            range: key.range,
            break_by_datasource: key.break_by_datasource,
            datasource: key.datasource.clone(),
        };
        let source = source_for(self.client.clone(), key.use_sql);
        let token = self.fetch_slot.issue(key);
        self.rows = None;
        self.load_state = LoadState::Loading;
        tracing::info!("Fetching segments for {:?} ({:?})", query.range, token);

        let tx = self.fetch_tx.clone();
        std::thread::spawn(move || {
            let result = source.fetch_intervals(&query);
            let _ = tx.send((token, result));
        });
    }

    /// Drain finished fetches, keeping only the latest request's result
    fn poll_fetches(&mut self) {
        while let Ok((token, result)) = self.fetch_rx.try_recv() {
            if !self.fetch_slot.accept(token) {
                tracing::debug!("Discarding stale response {:?}", token);
                continue;
            }
            match result {
                Ok(rows) => {
                    tracing::info!("Loaded {} interval rows", rows.len());
                    self.rows = Some(rows);
                    self.rebuild_bars();
                }
                Err(e) => {
                    tracing::warn!("Segment fetch failed: {}", e);
                    self.rows = None;
                    self.load_state = LoadState::Error(e.to_string());
                }
            }
        }
    }

    fn rebuild_bars(&mut self) {
        let Some(rows) = &self.rows else {
            return;
        };
        let result = build_bars(
            rows,
            self.settings.bucket_duration,
            self.settings.break_by_datasource,
        );
        self.load_state = match result {
            Ok(bars) => LoadState::from_bars(bars),
            Err(e) => LoadState::Error(e.to_string()),
        };
    }

    fn apply_event(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::RangeChange(range) => {
                tracing::info!("Range changed to {:?}", range);
                self.range = range;
            }
            GestureEvent::DrillDown(datasource) => {
                tracing::info!("Drill-down set to {:?}", datasource);
                self.datasource = datasource;
            }
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Segment Timeline");
        ui.add_space(10.0);

        // Cluster status
        ui.horizontal(|ui| {
            if self.api_connected {
                ui.colored_label(theme::accent::GREEN, "● Connected");
            } else {
                ui.colored_label(theme::accent::RED, "● Disconnected");
                if ui.button("Retry").clicked() {
                    self.check_api();
                    self.fetch_slot.invalidate();
                }
            }
        });
        ui.label(RichText::new(self.client.base_url()).small().color(theme::text::MUTED));

        if let Some(ref err) = self.api_error {
            ui.colored_label(theme::accent::RED, format!("Error: {}", err));
        }

        ui.add_space(10.0);

        egui::CollapsingHeader::new("Cluster")
            .default_open(false)
            .show(ui, |ui| {
                ui.label("Router URL:");
                let edit = ui.text_edit_singleline(&mut self.base_url_input);
                let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Connect").clicked() || submitted {
                    self.connect();
                }

                ui.add_space(5.0);
                ui.label("Retrieve intervals with:");
                ui.horizontal(|ui| {
                    if ui.selectable_label(self.settings.use_sql, "SQL").clicked() {
                        self.settings.use_sql = true;
                        self.mark_settings_dirty();
                    }
                    if ui.selectable_label(!self.settings.use_sql, "Coordinator").clicked() {
                        self.settings.use_sql = false;
                        self.mark_settings_dirty();
                    }
                });
            });

        egui::CollapsingHeader::new("Data")
            .default_open(true)
            .show(ui, |ui| {
                let prev_stat = self.settings.shown_stat;
                egui::ComboBox::from_id_salt("shown_stat")
                    .selected_text(self.settings.shown_stat.label())
                    .show_ui(ui, |ui| {
                        for kind in StatKind::ALL {
                            ui.selectable_value(&mut self.settings.shown_stat, kind, kind.label());
                        }
                    });
                if self.settings.shown_stat != prev_stat {
                    self.mark_settings_dirty();
                }

                let prev_duration = self.settings.bucket_duration;
                egui::ComboBox::from_id_salt("bucket_duration")
                    .selected_text(self.settings.bucket_duration.label())
                    .show_ui(ui, |ui| {
                        for duration in BucketDuration::ALL {
                            ui.selectable_value(
                                &mut self.settings.bucket_duration,
                                duration,
                                duration.label(),
                            );
                        }
                    });
                if self.settings.bucket_duration != prev_duration {
                    // Same rows, new buckets; no refetch needed
                    self.rebuild_bars();
                    self.mark_settings_dirty();
                }

                if ui
                    .checkbox(&mut self.settings.break_by_datasource, "Break by datasource")
                    .changed()
                {
                    self.mark_settings_dirty();
                }

                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    if ui.button("⟳ Reload").clicked() {
                        self.fetch_slot.invalidate();
                    }
                    if self.datasource.is_some() && ui.button("Show all").clicked() {
                        let event = self.gesture.show_all();
                        self.apply_event(event);
                    }
                });
            });

        egui::CollapsingHeader::new("Range")
            .default_open(true)
            .show(ui, |ui| {
                ui.label(format!("From: {}", format_instant(self.range.start)));
                ui.label(format!("To:   {}", format_instant(self.range.end)));

                ui.add_space(5.0);
                ui.horizontal_wrapped(|ui| {
                    for preset in RangePreset::ALL {
                        if ui.button(preset.label()).clicked() {
                            self.range = preset.range(Utc::now());
                            if let Some(months) = preset.months() {
                                self.settings.range_months = months;
                                self.mark_settings_dirty();
                            }
                        }
                    }
                });

                ui.add_space(5.0);
                ui.label(
                    RichText::new("Drag to zoom, drag the axis or hold shift to pan, click a bar to drill in")
                        .small()
                        .color(theme::text::MUTED),
                );
            });

        egui::CollapsingHeader::new("Interaction")
            .default_open(false)
            .show(ui, |ui| {
                if ui
                    .add(
                        egui::Slider::new(&mut self.settings.drag_threshold_px, 0.0..=10.0)
                            .text("Drag threshold (px)"),
                    )
                    .changed()
                {
                    self.gesture.set_drag_threshold(self.settings.drag_threshold_px);
                    self.mark_settings_dirty();
                }
            });
    }

    fn render_chart(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let title = match &self.datasource {
                Some(ds) => format!("Datasource: {}", ds),
                None => "All datasources".to_string(),
            };
            ui.label(RichText::new(title).strong().color(theme::text::PRIMARY));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(self.settings.shown_stat.label()).color(theme::text::SECONDARY),
                );
            });
        });

        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        let margin = self.settings.margin;
        let stage = Stage {
            width: rect.width() as f64,
            height: rect.height() as f64,
        };

        // Rebuilt every frame, so a resize is a full recompute
        let bars = self.load_state.bars();
        let scales = ChartScales::new(bars, self.range, stage, &margin, self.settings.shown_stat);
        let plot = Rect::from_min_size(
            Pos2::new(rect.left() + margin.left as f32, rect.top() + margin.top as f32),
            Vec2::new(scales.inner_width as f32, scales.inner_height as f32),
        );
        let to_plot = |p: Pos2| PointerPos::new((p.x - plot.left()) as f64, (p.y - plot.top()) as f64);

        // Input
        let (pressed, released, latest, shift) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
                i.modifiers.shift,
            )
        });

        // Hover is frozen while pressed so a click drills into the bar it started on
        if !self.gesture.is_pressed() {
            match response.hover_pos() {
                Some(pos) => {
                    let p = to_plot(pos);
                    let hovered = scales.bar_at(bars, p.x, p.y).map(|index| HoveredBar {
                        index,
                        datasource: bars[index].datasource.clone(),
                    });
                    self.gesture.hover(hovered);
                }
                None => self.gesture.leave(),
            }
        }

        if pressed && response.hovered() {
            if let Some(pos) = latest {
                self.gesture.pointer_down(to_plot(pos), &scales);
            }
        }

        let mut event = None;
        if self.gesture.listeners().is_subscribed() {
            if let Some(pos) = latest {
                self.gesture.pointer_move(to_plot(pos), shift, &scales);
            }
            if released {
                event = self.gesture.pointer_up(self.range);
            }
        }

        // Background
        painter.rect_filled(rect, 0.0, theme::bg::CHART);
        let band = Rect::from_min_max(
            Pos2::new(plot.left(), plot.bottom()),
            Pos2::new(plot.right(), rect.bottom()),
        );
        painter.rect_filled(band, 0.0, theme::bg::AXIS_BAND);

        match &self.load_state {
            LoadState::Loading => draw_message(&painter, plot, "Loading segments…", theme::text::MUTED),
            LoadState::Error(msg) => draw_message(&painter, plot, msg, theme::accent::RED),
            LoadState::NoData => draw_message(&painter, plot, "No segments in range", theme::text::MUTED),
            LoadState::Loaded(_) => {}
        }

        let time = self.gesture.display_time_scale(&scales.time);
        let axis = theme::stroke(theme::chart::AXIS, 1.0);

        if !bars.is_empty() {
            let meta = self.settings.shown_stat.meta();
            for (y, value) in stat_ticks(&scales, 4) {
                let sy = plot.top() + y as f32;
                painter.line_segment(
                    [Pos2::new(plot.left(), sy), Pos2::new(plot.right(), sy)],
                    theme::stroke(theme::chart::GRID, 1.0),
                );
                painter.text(
                    Pos2::new(plot.left() - 6.0, sy),
                    Align2::RIGHT_CENTER,
                    (meta.format_rate)(value),
                    FontId::proportional(11.0),
                    theme::text::MUTED,
                );
            }
        }

        // Bars, clipped so a live pan does not paint over the axes
        let bar_painter = painter.with_clip_rect(plot);
        let hovered = self.gesture.hovered().map(|h| h.index);
        for (i, bar) in bars.iter().enumerate() {
            let r = scales.bar_rect(bar, &time);
            let screen = Rect::from_min_max(
                Pos2::new(plot.left() + r.left as f32, plot.top() + r.top as f32),
                Pos2::new(plot.left() + r.right as f32, plot.top() + r.bottom as f32),
            );
            bar_painter.rect_filled(screen, 0.0, theme::datasource_color(bar.datasource.as_deref()));
            if hovered == Some(i) {
                bar_painter.rect_stroke(screen, 0.0, theme::stroke(theme::chart::BAR_HOVER, 1.5));
            }
        }

        // Axes
        painter.line_segment([plot.left_top(), plot.left_bottom()], axis);
        painter.line_segment([plot.left_bottom(), plot.right_bottom()], axis);
        for (x, t) in time_ticks(&time, 100.0) {
            let sx = plot.left() + x as f32;
            painter.line_segment(
                [Pos2::new(sx, plot.bottom()), Pos2::new(sx, plot.bottom() + 4.0)],
                axis,
            );
            painter.text(
                Pos2::new(sx, plot.bottom() + 6.0),
                Align2::CENTER_TOP,
                t.format("%Y-%m-%d").to_string(),
                FontId::proportional(11.0),
                theme::text::MUTED,
            );
        }

        // Selection window
        if let Some(selected) = self.gesture.pending_range() {
            let x0 = plot.left() + scales.time.apply(selected.start) as f32;
            let x1 = plot.left() + scales.time.apply(selected.end) as f32;
            let shade = Rect::from_min_max(Pos2::new(x0, plot.top()), Pos2::new(x1, plot.bottom()))
                .intersect(plot);
            painter.rect_filled(shade, 0.0, theme::accent::orange_subtle());
            let edge = theme::stroke(theme::chart::SELECTION_EDGE, 1.0);
            painter.line_segment([shade.left_top(), shade.left_bottom()], edge);
            painter.line_segment([shade.right_top(), shade.right_bottom()], edge);
        }

        if matches!(self.gesture.pending(), Some(PendingDrag::Offset(_))) {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }

        if !self.gesture.is_dragging() {
            if let Some(bar) = self.gesture.hovered().and_then(|h| bars.get(h.index)) {
                let lines = tooltip_lines(bar);
                response.on_hover_ui_at_pointer(|ui| {
                    for line in &lines {
                        ui.label(line);
                    }
                });
            }
        }

        if let Some(event) = event {
            self.apply_event(event);
        }
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_save_settings();
        self.poll_fetches();

        // Dark theme
        ctx.set_visuals(egui::Visuals::dark());

        egui::SidePanel::left("sidebar")
            .min_width(220.0)
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::PANEL)
                    .inner_margin(egui::Margin::same(10.0)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_sidebar(ui);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::bg::CHART))
            .show(ctx, |ui| {
                self.render_chart(ui);
            });

        // Picks up range, drill-down and option changes made this frame
        self.maybe_fetch();

        if matches!(self.load_state, LoadState::Loading) {
            // Still loading, request repaint to check again
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Force save settings on exit
        if self.settings_dirty {
            self.settings.save();
        }
    }
}

fn format_instant(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn draw_message(painter: &egui::Painter, plot: Rect, text: &str, color: Color32) {
    painter.text(
        plot.center(),
        Align2::CENTER_CENTER,
        text,
        FontId::proportional(14.0),
        color,
    );
}

/// Evenly spaced x ticks, roughly `spacing_px` apart
fn time_ticks(time: &TimeScale, spacing_px: f64) -> Vec<(f64, DateTime<Utc>)> {
    let width = time.width();
    if width <= 0.0 || spacing_px <= 0.0 {
        return Vec::new();
    }
    let n = ((width / spacing_px).floor() as usize).max(1);
    (0..=n)
        .map(|k| {
            let x = width * k as f64 / n as f64;
            (x, time.invert(x))
        })
        .collect()
}

/// `(y, value)` pairs from zero to the stat domain max
fn stat_ticks(scales: &ChartScales, count: usize) -> Vec<(f64, f64)> {
    let count = count.max(1);
    let max = scales.stat.max();
    (0..=count)
        .map(|k| {
            let value = max * k as f64 / count as f64;
            (scales.stat.apply(value), value)
        })
        .collect()
}

fn tooltip_lines(bar: &RenderableBar) -> Vec<String> {
    let mut lines = vec![
        bar.datasource
            .clone()
            .unwrap_or_else(|| "All datasources".to_string()),
        format!("{} → {}", format_instant(bar.start), format_instant(bar.end)),
    ];
    for kind in StatKind::ALL {
        let meta = kind.meta();
        lines.push(format!(
            "{}: {} ({})",
            meta.label,
            (meta.format_value)(bar.total(kind)),
            (meta.format_rate)(bar.value[kind]),
        ));
    }
    lines
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
