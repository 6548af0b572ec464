use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ReviewError, Result};
use crate::report::ReportSettings;
use crate::selection::SelectionPolicy;
use crate::window::WindowNavigator;

/// Review settings read from TOML. Every table and key is optional.
///
/// ```toml
/// [window]
/// sampling_rate_hz = 200
/// window_seconds = 3600
///
/// [selection]
/// min_duration_s = 8.0
/// max_duration_s = 12.0
/// require_non_empty_label = false
///
/// [report]
/// title = "ECG Abnormality Report"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewConfig {
    pub window: WindowNavigator,
    pub selection: SelectionPolicy,
    pub report: ReportSettings,
}

impl ReviewConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: ReviewConfig =
            toml::from_str(text).map_err(|e| ReviewError::format(format!("config: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Window settings are checked while parsing; this covers the rest.
    pub fn validate(&self) -> Result<()> {
        self.selection.validate()?;
        let rep = &self.report;
        if rep.raster_width == 0 || rep.raster_height == 0 {
            return Err(ReviewError::format("config: raster size must be positive"));
        }
        if !(rep.figure_width > 0.0 && rep.figure_height > 0.0) {
            return Err(ReviewError::format("config: figure size must be positive"));
        }
        Ok(())
    }
}
