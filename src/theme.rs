//! Color constants for the timeline chart and its side panel.
//!
//! All chart colors should be sourced from here so bars, axes and overlays
//! stay consistent.

use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Chart area background - darkest layer
    pub const CHART: Color32 = Color32::from_rgb(14, 17, 23);

    /// Panel backgrounds - slightly lighter than the chart
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);

    /// Axis band under the plot, where a press pans instead of selecting
    pub const AXIS_BAND: Color32 = Color32::from_rgb(30, 33, 40);
}

/// Accent colors
pub mod accent {
    use super::*;

    pub const ORANGE: Color32 = Color32::from_rgb(255, 149, 0);

    /// Orange with reduced opacity for the selection window
    pub fn orange_subtle() -> Color32 {
        Color32::from_rgba_unmultiplied(255, 149, 0, 60)
    }

    pub const GREEN: Color32 = Color32::from_rgb(34, 197, 94);

    pub const RED: Color32 = Color32::from_rgb(239, 68, 68);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    pub const SECONDARY: Color32 = Color32::from_rgb(180, 180, 190);

    /// Axis labels and placeholder messages
    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// Chart-specific colors
pub mod chart {
    use super::*;

    /// Bars when the chart is not broken down by datasource
    pub const BAR: Color32 = Color32::from_rgb(80, 90, 110);

    /// Outline of the hovered bar
    pub const BAR_HOVER: Color32 = Color32::WHITE;

    /// Axis lines
    pub const AXIS: Color32 = Color32::from_rgb(60, 65, 75);

    /// Grid lines behind the bars
    pub const GRID: Color32 = Color32::from_rgb(30, 33, 40);

    /// Selection window edges
    pub const SELECTION_EDGE: Color32 = super::accent::ORANGE;
}

/// Helper to create a stroke with consistent styling
pub fn stroke(color: Color32, width: f32) -> egui::Stroke {
    egui::Stroke::new(width, color)
}

/// Stable color for a datasource; `None` gets the neutral bar color
pub fn datasource_color(datasource: Option<&str>) -> Color32 {
    match datasource {
        Some(name) => {
            // Hash the name for consistent colors across reloads
            let hash = name
                .bytes()
                .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
            let hue = (hash % 360) as f32;
            hsl_to_rgb(hue, 0.6, 0.5)
        }
        None => chart::BAR,
    }
}

/// Convert HSL to RGB color
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color32 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Color32::from_rgb(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}
