// Pairwise overlap resolution.
//
// Scans every pair of bubbles (O(n^2)); an overlapping pair is pushed apart
// along the line between their centers until they just touch, then both are
// clamped back into the viewport. Unpinned bubbles yield to pinned ones. Passes
// repeat until a clean scan or the iteration budget runs out, in which case
// the arrangement is best effort and the report says so.

use serde::Serialize;

use crate::config::OverlapConfig;
use crate::error::{LayoutError, Result};
use crate::model::{Placement, Point, Viewport};

use super::algorithms::golden_angle;
use super::clamp::clamp_center;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OverlapReport {
    /// Passes run, including the final clean one.
    pub iterations: usize,
    /// Distinct bubbles whose center changed.
    pub moved: usize,
    /// Overlapping pairs left at the end.
    pub remaining: usize,
    pub converged: bool,
}

impl OverlapReport {
    pub fn check(&self) -> Result<()> {
        if self.converged {
            Ok(())
        } else {
            Err(LayoutError::NonConvergentOverlap {
                iterations: self.iterations,
                remaining: self.remaining,
            })
        }
    }
}

fn overlapping(a: Point, ra: f64, b: Point, rb: f64, epsilon: f64) -> bool {
    a.distance(&b) < ra + rb - epsilon
}

pub fn count_overlaps(placements: &[Placement], epsilon: f64) -> usize {
    let mut count = 0;
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            if overlapping(a.center, a.radius(), b.center, b.radius(), epsilon) {
                count += 1;
            }
        }
    }
    count
}

/// Separate overlapping bubbles in place.
pub fn resolve_overlaps(placements: &mut [Placement], viewport: &Viewport, cfg: &OverlapConfig) -> OverlapReport {
    let n = placements.len();
    let radii: Vec<f64> = placements.iter().map(|p| p.radius()).collect();
    let pinned: Vec<bool> = placements.iter().map(|p| p.pinned).collect();
    let mut centers: Vec<Point> = placements
        .iter()
        .zip(&radii)
        .map(|(p, &r)| clamp_center(p.center, r, viewport))
        .collect();

    let mut iterations = 0;
    while iterations < cfg.max_iterations {
        iterations += 1;
        let mut any_overlap = false;

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (centers[i], centers[j]);
                if !overlapping(a, radii[i], b, radii[j], cfg.epsilon) {
                    continue;
                }
                any_overlap = true;

                let dist = a.distance(&b);
                let (ux, uy) = if dist > 1e-9 {
                    ((b.x - a.x) / dist, (b.y - a.y) / dist)
                } else {
                    // Coincident centers: any direction works, keep it deterministic.
                    let angle = golden_angle() * (j + 1) as f64;
                    (angle.cos(), angle.sin())
                };
                let push = radii[i] + radii[j] - dist;
                let share_a = match (pinned[i], pinned[j]) {
                    (true, false) => 0.0,
                    (false, true) => 1.0,
                    _ => 0.5,
                };

                // a moves along -u, b along +u. Whatever one side cannot take
                // because of the viewport edge goes to the other.
                let shift = |p: Point, r: f64, d: f64| {
                    clamp_center(Point { x: p.x + ux * d, y: p.y + uy * d }, r, viewport)
                };
                let along = |from: Point, to: Point| (to.x - from.x) * ux + (to.y - from.y) * uy;

                let new_a = shift(a, radii[i], -push * share_a);
                let moved_a = -along(a, new_a);
                let new_b = shift(b, radii[j], push - moved_a);
                let moved_b = along(b, new_b);
                let leftover = push - moved_a - moved_b;
                centers[i] = if leftover > 0.0 { shift(new_a, radii[i], -leftover) } else { new_a };
                centers[j] = new_b;
            }
        }

        if !any_overlap {
            break;
        }
    }

    let mut moved = 0;
    for (p, c) in placements.iter_mut().zip(&centers) {
        if p.center != *c {
            p.center = *c;
            moved += 1;
        }
    }
    let remaining = count_overlaps(placements, cfg.epsilon);

    OverlapReport {
        iterations,
        moved,
        remaining,
        converged: remaining == 0,
    }
}
