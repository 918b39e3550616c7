//! Engine configuration.
//!
//! Every section has a `Default` matching the production tuning, and all of it
//! deserializes from a partial JSON document so the host only needs to send
//! the values it wants to override.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A screen resolution with a hand-tuned column count.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownResolution {
    pub width: f64,
    pub height: f64,
    pub columns: usize,
}

/// Lower width bound of a column band (`width >= min_width`).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthBand {
    pub min_width: f64,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Checked in order before `width_bands`. First exact match wins, then the
    /// first approximate match.
    pub known_resolutions: Vec<KnownResolution>,
    /// Allowed distance from a known width for an approximate match.
    pub width_tolerance: f64,
    /// A viewport may be shorter than the screen height by up to this much
    /// (browser chrome, task bars) and still match.
    pub height_tolerance: f64,
    /// Sorted by `min_width` descending.
    pub width_bands: Vec<WidthBand>,
    pub fallback_columns: usize,
    pub margin_x: f64,
    pub margin_y: f64,
    pub row_gap: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            known_resolutions: vec![
                KnownResolution { width: 3840.0, height: 2160.0, columns: 18 },
                KnownResolution { width: 2560.0, height: 1440.0, columns: 15 },
                KnownResolution { width: 1920.0, height: 1080.0, columns: 12 },
                KnownResolution { width: 1680.0, height: 1050.0, columns: 11 },
                KnownResolution { width: 1536.0, height: 864.0, columns: 10 },
                KnownResolution { width: 1440.0, height: 900.0, columns: 10 },
                KnownResolution { width: 1366.0, height: 768.0, columns: 9 },
                KnownResolution { width: 1280.0, height: 720.0, columns: 8 },
            ],
            width_tolerance: 8.0,
            height_tolerance: 160.0,
            width_bands: vec![
                WidthBand { min_width: 2400.0, columns: 16 },
                WidthBand { min_width: 1800.0, columns: 14 },
                WidthBand { min_width: 1440.0, columns: 14 },
                WidthBand { min_width: 1200.0, columns: 8 },
                WidthBand { min_width: 1000.0, columns: 6 },
            ],
            fallback_columns: 5,
            margin_x: 20.0,
            margin_y: 16.0,
            row_gap: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobileConfig {
    /// Viewports at most this wide use the mobile grid.
    pub breakpoint: f64,
    pub columns: usize,
    /// Viewports at most this wide shrink items by `narrow_scale`.
    pub narrow_width: f64,
    pub narrow_scale: f64,
    pub margin_x: f64,
    pub margin_y: f64,
    /// Larger than the desktop gap so bubbles stay clear of row controls.
    pub row_gap: f64,
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            breakpoint: 480.0,
            columns: 4,
            narrow_width: 320.0,
            narrow_scale: 0.85,
            margin_x: 8.0,
            margin_y: 12.0,
            row_gap: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralConfig {
    /// Radius of the first ring, in reference diameters.
    pub base_radius_factor: f64,
    /// Growth per `sqrt(i)`, in reference diameters.
    pub scale_factor: f64,
    /// Distance kept from every viewport edge.
    pub margin: f64,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            base_radius_factor: 0.6,
            scale_factor: 0.95,
            margin: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    pub max_iterations: usize,
    /// Sub-pixel tolerance: pairs closer than `r_a + r_b - epsilon` overlap.
    pub epsilon: f64,
    /// Rings tried by the incremental clamp before giving up on a free spot.
    pub clamp_search_rings: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            epsilon: 0.5,
            clamp_search_rings: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Rendered positions closer than this to the model are not written back.
    pub threshold_px: f64,
    /// Rendered elements are looked up as `{element_id_prefix}{item id}`.
    pub element_id_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            threshold_px: 1.0,
            element_id_prefix: "bubble-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub resize_debounce_ms: f64,
    pub event_debounce_ms: f64,
    pub overlap_tick_ms: f64,
    /// How often the browser timer polls the orchestrator.
    pub poll_interval_ms: i32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 300.0,
            event_debounce_ms: 300.0,
            overlap_tick_ms: 1000.0,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub mobile: MobileConfig,
    pub spiral: SpiralConfig,
    pub overlap: OverlapConfig,
    pub sync: SyncConfig,
    pub timing: TimingConfig,
}

impl EngineConfig {
    pub fn from_json(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(input)?)
    }
}
