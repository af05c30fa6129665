//! Segment Timeline
//!
//! A native desktop view of how much data a Druid cluster holds over time.

mod app;
mod settings;
mod source;
mod theme;
mod timeline;

use eframe::egui;

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_title("Segment Timeline"),
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native(
        "Segment Timeline",
        options,
        Box::new(|cc| Ok(Box::new(app::TimelineApp::new(cc)))),
    )
}
