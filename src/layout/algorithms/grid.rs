//! Ranked grid layouts.
//!
//! Bubbles fill the viewport left-to-right, top-to-bottom in rank order, one
//! per cell, centered in the cell. All cells share the size of the first
//! ranked bubble; the rendered diameter of each bubble still follows its own
//! `size`.
//!
//! The desktop column count comes from a table of known resolutions (tuned by
//! hand) before falling back to width bands. The mobile grid always uses a
//! small fixed column count and shrinks bubbles on very narrow phones.

use crate::config::{EngineConfig, GridConfig, MobileConfig, OverlapConfig};
use crate::layout::clamp::ViewportClamp;
use crate::layout::{Layout, LayoutStrategy};
use crate::model::{Item, LayoutMode, Placement, Point, Viewport};

/// Desktop grid.
pub struct GridLayout;

impl LayoutStrategy for GridLayout {
    fn place(&self, ranked: &[Item], viewport: &Viewport, cfg: &EngineConfig) -> Layout {
        layout_grid(ranked, viewport, &cfg.grid, &cfg.overlap)
    }
}

/// Phone grid.
pub struct MobileGridLayout;

impl LayoutStrategy for MobileGridLayout {
    fn place(&self, ranked: &[Item], viewport: &Viewport, cfg: &EngineConfig) -> Layout {
        layout_mobile_grid(ranked, viewport, &cfg.mobile, &cfg.overlap)
    }
}

/// Column count for a desktop viewport.
pub fn desktop_columns(viewport: &Viewport, cfg: &GridConfig) -> usize {
    let (w, h) = (viewport.width, viewport.height);

    let exact = cfg
        .known_resolutions
        .iter()
        .find(|r| r.width == w && r.height == h);
    // Browser viewports are the screen minus chrome, so only shorter heights match.
    let approximate = || {
        cfg.known_resolutions.iter().find(|r| {
            (w - r.width).abs() <= cfg.width_tolerance && h <= r.height && r.height - h <= cfg.height_tolerance
        })
    };
    if let Some(known) = exact.or_else(approximate) {
        return known.columns.max(1);
    }

    cfg.width_bands
        .iter()
        .find(|band| w >= band.min_width)
        .map(|band| band.columns)
        .unwrap_or(cfg.fallback_columns)
        .max(1)
}

/// Effective size multiplier for the mobile grid.
pub fn mobile_scale(viewport: &Viewport, cfg: &MobileConfig) -> f64 {
    if viewport.width <= cfg.narrow_width {
        cfg.narrow_scale
    } else {
        1.0
    }
}

#[derive(Debug, Copy, Clone)]
struct GridMetrics {
    mode: LayoutMode,
    columns: usize,
    margin_x: f64,
    margin_y: f64,
    row_gap: f64,
    scale: f64,
}

pub fn layout_grid(ranked: &[Item], viewport: &Viewport, cfg: &GridConfig, overlap: &OverlapConfig) -> Layout {
    let metrics = GridMetrics {
        mode: LayoutMode::DesktopGrid,
        columns: desktop_columns(viewport, cfg),
        margin_x: cfg.margin_x,
        margin_y: cfg.margin_y,
        row_gap: cfg.row_gap,
        scale: 1.0,
    };
    place_in_grid(ranked, viewport, metrics, overlap)
}

pub fn layout_mobile_grid(ranked: &[Item], viewport: &Viewport, cfg: &MobileConfig, overlap: &OverlapConfig) -> Layout {
    let metrics = GridMetrics {
        mode: LayoutMode::Mobile,
        columns: cfg.columns.max(1),
        margin_x: cfg.margin_x,
        margin_y: cfg.margin_y,
        row_gap: cfg.row_gap,
        scale: mobile_scale(viewport, cfg),
    };
    place_in_grid(ranked, viewport, metrics, overlap)
}

fn place_in_grid(ranked: &[Item], viewport: &Viewport, m: GridMetrics, overlap: &OverlapConfig) -> Layout {
    let Some(first) = ranked.first() else {
        return Layout::empty(m.mode, m.scale);
    };

    let reference = first.size * m.scale;
    let usable_w = viewport.width - 2.0 * m.margin_x;
    let (margin_x, usable_w) = if usable_w > 0.0 {
        (m.margin_x, usable_w)
    } else {
        (0.0, viewport.width)
    };
    let cell_w = usable_w / m.columns as f64;
    let row_h = reference + m.row_gap;
    let top = viewport.top_padding + m.margin_y;

    let mut clamp = ViewportClamp::for_items(*viewport, ranked, m.scale, overlap);
    let mut placements = Vec::with_capacity(ranked.len());

    for (i, item) in ranked.iter().enumerate() {
        let row = i / m.columns;
        let col = i % m.columns;
        let candidate = Point {
            x: margin_x + col as f64 * cell_w + cell_w / 2.0,
            y: top + row as f64 * row_h + reference / 2.0,
        };
        let diameter = item.size * m.scale;
        let center = clamp.place(candidate, diameter / 2.0);
        placements.push(Placement {
            id: item.id.clone(),
            center,
            diameter,
            pinned: item.pinned,
        });
    }

    log::debug!(
        "grid layout: mode={} columns={} cell_w={:.1} placed={}",
        m.mode.as_str(),
        m.columns,
        cell_w,
        placements.len()
    );

    Layout {
        mode: m.mode,
        columns: Some(m.columns),
        size_scale: m.scale,
        placements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ranking::rank_items;

    fn items(n: usize, size: f64) -> Vec<Item> {
        (0..n).map(|i| Item::new(&format!("item{i:03}"), size, (n - i) as i64)).collect()
    }

    #[test]
    fn test_known_resolution_2560x1440() {
        let vp = Viewport::new(2560.0, 1440.0, 0.0);
        let layout = layout_grid(&items(70, 100.0), &vp, &GridConfig::default(), &OverlapConfig::default());
        assert_eq!(layout.columns, Some(15));
        assert_eq!(layout.placements.len(), 70);
    }

    #[test]
    fn test_known_resolution_1366x768() {
        let vp = Viewport::new(1366.0, 768.0, 0.0);
        let layout = layout_grid(&items(32, 80.0), &vp, &GridConfig::default(), &OverlapConfig::default());
        assert_eq!(layout.columns, Some(9));
    }

    #[test]
    fn test_approximate_resolution_match() {
        // 1366x768 screen with browser chrome.
        let vp = Viewport::new(1366.0, 657.0, 0.0);
        assert_eq!(desktop_columns(&vp, &GridConfig::default()), 9);
    }

    #[test]
    fn test_width_band_fallback() {
        let cfg = GridConfig::default();
        assert_eq!(desktop_columns(&Viewport::new(2450.0, 1000.0, 0.0), &cfg), 16);
        assert_eq!(desktop_columns(&Viewport::new(1850.0, 1000.0, 0.0), &cfg), 14);
        assert_eq!(desktop_columns(&Viewport::new(1500.0, 1000.0, 0.0), &cfg), 14);
        assert_eq!(desktop_columns(&Viewport::new(1250.0, 1000.0, 0.0), &cfg), 8);
        assert_eq!(desktop_columns(&Viewport::new(1010.0, 1000.0, 0.0), &cfg), 6);
        assert_eq!(desktop_columns(&Viewport::new(700.0, 1000.0, 0.0), &cfg), 5);
    }

    #[test]
    fn test_rows_and_columns_follow_rank() {
        let vp = Viewport::new(1366.0, 768.0, 50.0);
        let layout = layout_grid(&items(12, 80.0), &vp, &GridConfig::default(), &OverlapConfig::default());
        let p = &layout.placements;
        // Same row, increasing x.
        assert!(p[0].center.x < p[1].center.x);
        assert_eq!(p[0].center.y, p[8].center.y);
        // Item 9 wraps to column 0 of row 1.
        assert_eq!(p[9].center.x, p[0].center.x);
        assert!(p[9].center.y > p[0].center.y);
    }

    #[test]
    fn test_single_item_row0_col0() {
        let vp = Viewport::new(1366.0, 768.0, 50.0);
        let cfg = GridConfig::default();
        let layout = layout_grid(&items(1, 80.0), &vp, &cfg, &OverlapConfig::default());
        let cell_w = (1366.0 - 2.0 * cfg.margin_x) / 9.0;
        let c = layout.placements[0].center;
        assert_eq!(c.x, cfg.margin_x + cell_w / 2.0);
        assert_eq!(c.y, 50.0 + cfg.margin_y + 40.0);
    }

    #[test]
    fn test_empty_is_noop() {
        let vp = Viewport::new(1366.0, 768.0, 0.0);
        let layout = layout_grid(&[], &vp, &GridConfig::default(), &OverlapConfig::default());
        assert!(layout.placements.is_empty());
    }

    #[test]
    fn test_pinned_takes_first_cell() {
        let vp = Viewport::new(1366.0, 768.0, 0.0);
        let ranked = rank_items(&[Item::new("popular", 80.0, 1000), Item::new("bumped", 80.0, 1).pinned()]);
        let layout = layout_grid(&ranked, &vp, &GridConfig::default(), &OverlapConfig::default());
        let first = &layout.placements[0];
        assert_eq!(first.id.0, "bumped");
        assert!(first.center.x < layout.placements[1].center.x);
    }

    #[test]
    fn test_deterministic() {
        let vp = Viewport::new(1920.0, 1080.0, 64.0);
        let input = items(40, 90.0);
        let a = layout_grid(&input, &vp, &GridConfig::default(), &OverlapConfig::default());
        let b = layout_grid(&input, &vp, &GridConfig::default(), &OverlapConfig::default());
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_grid_stays_in_bounds() {
        let vp = Viewport::new(1280.0, 720.0, 80.0);
        let layout = layout_grid(&items(30, 100.0), &vp, &GridConfig::default(), &OverlapConfig::default());
        for p in &layout.placements {
            assert!(vp.contains_circle(p.center, p.radius()), "{:?} out of bounds", p);
        }
    }

    #[test]
    fn test_small_leader_with_huge_followers() {
        let vp = Viewport::new(2560.0, 1440.0, 0.0);
        let mut input = vec![Item::new("dot", 1.0, 100)];
        input.extend((0..5).map(|i| Item::new(&format!("big{i}"), 1200.0, i)));
        let layout = layout_grid(&rank_items(&input), &vp, &GridConfig::default(), &OverlapConfig::default());
        assert_eq!(layout.placements.len(), 6);
        assert_eq!(layout.placements[0].id.0, "dot");
        for p in &layout.placements {
            assert!(vp.contains_circle(p.center, p.radius()), "{:?} out of bounds", p);
        }
    }

    #[test]
    fn test_mobile_narrow_phone() {
        let vp = Viewport::new(300.0, 600.0, 0.0);
        let layout = layout_mobile_grid(&items(8, 60.0), &vp, &MobileConfig::default(), &OverlapConfig::default());
        assert_eq!(layout.columns, Some(4));
        assert!(layout.placements.iter().all(|p| p.diameter <= 60.0 * 0.85));
        // Two rows of four.
        assert_eq!(layout.placements[0].center.y, layout.placements[3].center.y);
        assert!(layout.placements[4].center.y > layout.placements[3].center.y);
    }

    #[test]
    fn test_mobile_regular_phone_keeps_size() {
        let vp = Viewport::new(414.0, 800.0, 0.0);
        let layout = layout_mobile_grid(&items(8, 60.0), &vp, &MobileConfig::default(), &OverlapConfig::default());
        assert_eq!(layout.columns, Some(4));
        assert!(layout.placements.iter().all(|p| p.diameter == 60.0));
    }
}
