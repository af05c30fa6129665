//! Persistent settings for the timeline app.

use crate::source::DEFAULT_BASE_URL;
use crate::timeline::{BucketDuration, Margin, StatKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// All persistable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // Cluster
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Query `sys.segments` with SQL instead of listing intervals per datasource
    #[serde(default = "default_use_sql")]
    pub use_sql: bool,

    // Data
    #[serde(default)]
    pub bucket_duration: BucketDuration,
    #[serde(default)]
    pub break_by_datasource: bool,
    #[serde(default)]
    pub shown_stat: StatKind,
    #[serde(default = "default_range_months")]
    pub range_months: u32,

    // Interaction
    #[serde(default = "default_drag_threshold_px")]
    pub drag_threshold_px: f64,
    #[serde(default)]
    pub margin: Margin,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_use_sql() -> bool {
    true
}

fn default_range_months() -> u32 {
    3
}

fn default_drag_threshold_px() -> f64 {
    2.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            use_sql: true,
            bucket_duration: BucketDuration::Day,
            break_by_datasource: false,
            shown_stat: StatKind::Size,
            range_months: default_range_months(),
            drag_threshold_px: default_drag_threshold_px(),
            margin: Margin::default(),
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("segment-timeline");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            // File doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, settings not saved");
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }
}
