// Viewport clamping during placement.
//
// Every placer runs its candidates through `ViewportClamp::place`, which keeps
// the bubble fully visible below the header band and, when cheap, nudges it
// off bubbles placed earlier in the same pass. Anything still overlapping is
// left for the overlap resolver.

use std::f64::consts::TAU;

use crate::config::OverlapConfig;
use crate::model::{Item, Point, Viewport};

use super::spatial_grid::{Circle, SpatialGrid};

fn clamp_axis(value: f64, lo: f64, hi: f64) -> f64 {
    if lo > hi || !value.is_finite() {
        // Bubble larger than the viewport (or garbage input): center it.
        return (lo + hi) / 2.0;
    }
    value.clamp(lo, hi)
}

/// Nearest center keeping the circle inside the viewport, `margin` from every edge.
pub fn clamp_center_with_margin(candidate: Point, radius: f64, viewport: &Viewport, margin: f64) -> Point {
    let inset = radius + margin;
    Point {
        x: clamp_axis(candidate.x, inset, viewport.width - inset),
        y: clamp_axis(candidate.y, viewport.top_padding + inset, viewport.height - inset),
    }
}

pub fn clamp_center(candidate: Point, radius: f64, viewport: &Viewport) -> Point {
    clamp_center_with_margin(candidate, radius, viewport, 0.0)
}

/// Incremental clamp over the circles already placed in this pass.
#[derive(Debug, Clone)]
pub struct ViewportClamp {
    viewport: Viewport,
    margin: f64,
    epsilon: f64,
    search_rings: usize,
    placed: SpatialGrid,
}

impl ViewportClamp {
    pub fn new(viewport: Viewport, reference_diameter: f64, cfg: &OverlapConfig) -> Self {
        Self {
            viewport,
            margin: 0.0,
            epsilon: cfg.epsilon,
            search_rings: cfg.clamp_search_rings,
            placed: SpatialGrid::new(reference_diameter),
        }
    }

    /// Hash cells sized to the largest rendered diameter in `items`, so no
    /// bubble spans more than a 2x2 block of cells.
    pub fn for_items(viewport: Viewport, items: &[Item], size_scale: f64, cfg: &OverlapConfig) -> Self {
        let largest = items.iter().map(|i| i.size * size_scale).fold(0.0, f64::max);
        Self::new(viewport, largest, cfg)
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Clamp `candidate` into bounds, prefer a nearby free spot, and record it.
    pub fn place(&mut self, candidate: Point, radius: f64) -> Point {
        let clamped = clamp_center_with_margin(candidate, radius, &self.viewport, self.margin);
        let spot = self.find_free(clamped, radius).unwrap_or(clamped);
        self.placed.insert(Circle { center: spot, radius });
        spot
    }

    /// Ring search around `start`, one radius per ring.
    fn find_free(&self, start: Point, radius: f64) -> Option<Point> {
        let free = |center: Point| !self.placed.overlaps_any(&Circle { center, radius }, self.epsilon);
        if free(start) {
            return Some(start);
        }

        let step = radius.max(1.0);
        for ring in 1..=self.search_rings {
            let dist = step * ring as f64;
            let samples = 8 * ring;
            for k in 0..samples {
                let angle = TAU * k as f64 / samples as f64;
                let p = Point {
                    x: start.x + dist * angle.cos(),
                    y: start.y + dist * angle.sin(),
                };
                let inside = self.viewport.contains_circle(p, radius + self.margin);
                if inside && free(p) {
                    return Some(p);
                }
            }
        }
        None
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn cell_size(&self) -> f64 {
        self.placed.cell_size()
    }
}
