//! Golden-angle spiral layout.
//!
//! The top-ranked bubble sits at the center of the placement band and the rest
//! wind outwards at `i * π(3 - √5)` radians, radius `base + scale * √i`. Only
//! used when the host explicitly asks for it.

use std::f64::consts::PI;

use crate::config::{EngineConfig, OverlapConfig, SpiralConfig};
use crate::layout::clamp::ViewportClamp;
use crate::layout::{Layout, LayoutStrategy};
use crate::model::{Item, LayoutMode, Placement, Point, Viewport};

pub struct SpiralLayout;

impl LayoutStrategy for SpiralLayout {
    fn place(&self, ranked: &[Item], viewport: &Viewport, cfg: &EngineConfig) -> Layout {
        layout_spiral(ranked, viewport, &cfg.spiral, &cfg.overlap)
    }
}

pub fn golden_angle() -> f64 {
    PI * (3.0 - 5.0f64.sqrt())
}

/// Unclamped spiral point for rank `i` around `center`.
pub fn spiral_point(center: Point, i: usize, base_radius: f64, scale: f64) -> Point {
    if i == 0 {
        return center;
    }
    let angle = i as f64 * golden_angle();
    let radius = base_radius + scale * (i as f64).sqrt();
    Point {
        x: center.x + radius * angle.cos(),
        y: center.y + radius * angle.sin(),
    }
}

pub fn layout_spiral(ranked: &[Item], viewport: &Viewport, cfg: &SpiralConfig, overlap: &OverlapConfig) -> Layout {
    let Some(first) = ranked.first() else {
        return Layout::empty(LayoutMode::DesktopSpiral, 1.0);
    };

    let reference = first.size;
    let base_radius = cfg.base_radius_factor * reference;
    let scale = cfg.scale_factor * reference;
    let center = viewport.center();

    let mut clamp = ViewportClamp::for_items(*viewport, ranked, 1.0, overlap).with_margin(cfg.margin);
    let placements = ranked
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let candidate = spiral_point(center, i, base_radius, scale);
            Placement {
                id: item.id.clone(),
                center: clamp.place(candidate, item.radius()),
                diameter: item.size,
                pinned: item.pinned,
            }
        })
        .collect();

    Layout {
        mode: LayoutMode::DesktopSpiral,
        columns: None,
        size_scale: 1.0,
        placements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<Item> {
        (0..n).map(|i| Item::new(&format!("s{i:02}"), 80.0, 0)).collect()
    }

    #[test]
    fn test_golden_angle_value() {
        assert!((golden_angle() - 2.399_963_229_728_653).abs() < 1e-12);
    }

    #[test]
    fn test_first_item_at_center() {
        let vp = Viewport::new(1600.0, 900.0, 100.0);
        let layout = layout_spiral(&items(5), &vp, &SpiralConfig::default(), &OverlapConfig::default());
        assert_eq!(layout.placements[0].center, Point::new(800.0, 500.0));
    }

    #[test]
    fn test_radius_grows_with_rank() {
        let c = Point::new(0.0, 0.0);
        let d = |i| spiral_point(c, i, 50.0, 80.0).distance(&c);
        assert!(d(1) < d(2));
        assert!(d(2) < d(10));
        assert!((d(4) - (50.0 + 80.0 * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_into_viewport_with_margin() {
        let vp = Viewport::new(700.0, 500.0, 60.0);
        let cfg = SpiralConfig::default();
        let layout = layout_spiral(&items(60), &vp, &cfg, &OverlapConfig::default());
        for p in &layout.placements {
            assert!(vp.contains_circle(p.center, p.radius()), "{:?} out of bounds", p);
        }
    }

    #[test]
    fn test_sparse_spiral_has_no_overlap() {
        let vp = Viewport::new(1920.0, 1080.0, 0.0);
        let layout = layout_spiral(&items(12), &vp, &SpiralConfig::default(), &OverlapConfig::default());
        let p = &layout.placements;
        for i in 0..p.len() {
            for j in (i + 1)..p.len() {
                assert!(p[i].center.distance(&p[j].center) >= 80.0 - 0.5);
            }
        }
    }
}
