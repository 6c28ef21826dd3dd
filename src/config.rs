use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Palette;

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Savitzky–Golay parameters used for DTG curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    pub window_length: usize,
    pub poly_order: usize,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            window_length: 21,
            poly_order: 2,
        }
    }
}

/// Which colours pinned spectra and comparison runs cycle through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaletteChoice {
    /// The 10-colour qualitative palette of the dashboard.
    Plotly,
    /// `count` evenly spaced hues.
    Generated { count: usize },
}

impl Default for PaletteChoice {
    fn default() -> Self {
        PaletteChoice::Plotly
    }
}

impl PaletteChoice {
    pub fn build(&self) -> Palette {
        match self {
            PaletteChoice::Plotly => Palette::plotly(),
            PaletteChoice::Generated { count } => Palette::generated(*count),
        }
    }
}

/// Everything tunable about the engine. Every field has a default, so a
/// config file only needs the keys it wants to change:
///
/// ```json
/// { "smoothing": { "window_length": 31 }, "palette": { "kind": "generated", "count": 6 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub smoothing: SmoothingParams,
    /// Factor turning the TG time column into seconds (exports are in minutes).
    pub tg_time_scale: f64,
    /// Decimals kept when a selected time is written back to the manual input.
    pub display_decimals: u32,
    pub palette: PaletteChoice,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingParams::default(),
            tg_time_scale: 60.0,
            display_decimals: 2,
            palette: PaletteChoice::default(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: EngineConfig =
            serde_json::from_str(&text).context("parsing config JSON")?;
        log::debug!("Loaded engine config from {}: {config:?}", path.display());
        Ok(config)
    }
}
