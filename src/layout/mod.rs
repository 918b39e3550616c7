// Bubble layout.
//
// Goals:
// - Pure: `(items, viewport, mode) -> Layout`, no view or model access
// - Deterministic: same ranked input and viewport give bit-identical output
// - Rank-aware: pinned and high-score bubbles get the first cells / the center
// - In bounds: every bubble stays inside the viewport below the header band
//
// Submodules:
// - ranking: placement priority
// - selector: mobile / desktop grid / spiral choice
// - algorithms: grid and spiral placers
// - clamp + spatial_grid: bounds clamping and nudging during placement
// - overlap: pairwise overlap resolution after placement

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{LayoutError, Result};
use crate::model::{Item, LayoutMode, Placement, Viewport};

pub mod algorithms;
mod clamp;
mod overlap;
mod ranking;
mod selector;
mod spatial_grid;

pub use clamp::{ViewportClamp, clamp_center, clamp_center_with_margin};
pub use overlap::{OverlapReport, count_overlaps, resolve_overlaps};
pub use ranking::{compare_rank, rank_items};
pub use selector::{DesktopPreference, select_mode, strategy_for};
pub use spatial_grid::{Circle, SpatialGrid};

/// A placement strategy over an already ranked item list.
pub trait LayoutStrategy {
    fn place(&self, ranked: &[Item], viewport: &Viewport, cfg: &EngineConfig) -> Layout;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub mode: LayoutMode,
    /// Grid column count; `None` for the spiral.
    pub columns: Option<usize>,
    /// Rendered diameter multiplier applied to every item.
    pub size_scale: f64,
    /// In rank order.
    pub placements: Vec<Placement>,
}

impl Layout {
    pub fn empty(mode: LayoutMode, size_scale: f64) -> Self {
        Self {
            mode,
            columns: None,
            size_scale,
            placements: Vec::new(),
        }
    }
}

pub fn check_viewport(viewport: &Viewport) -> Result<()> {
    if viewport.is_degenerate() {
        return Err(LayoutError::DegenerateViewport {
            width: viewport.width,
            height: viewport.height,
            top_padding: viewport.top_padding,
        });
    }
    Ok(())
}

/// Rank `items` and place them with the strategy for `mode`.
pub fn layout_items(items: &[Item], viewport: &Viewport, mode: LayoutMode, cfg: &EngineConfig) -> Result<Layout> {
    check_viewport(viewport)?;
    let ranked = rank_items(items);
    Ok(strategy_for(mode).place(&ranked, viewport, cfg))
}
