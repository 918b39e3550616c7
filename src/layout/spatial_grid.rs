// Spatial hash grid for placed circles.
//
// Instead of checking a candidate against every placed bubble, circles are
// bucketed by the cells their bounding box touches.

use std::collections::HashMap;

use crate::model::Point;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    /// Overlap with a sub-pixel tolerance: touching circles do not overlap.
    pub fn overlaps(&self, other: &Circle, epsilon: f64) -> bool {
        self.center.distance(&other.center) < self.radius + other.radius - epsilon
    }
}

/// A spatial hash grid for circle overlap queries.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    /// Cell coordinates to indices into `circles`.
    cells: HashMap<(i64, i64), Vec<usize>>,
    circles: Vec<Circle>,
}

impl SpatialGrid {
    /// Cell size should be roughly the diameter of the largest expected circle.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 1.0 { cell_size } else { 1.0 },
            cells: HashMap::new(),
            circles: Vec::new(),
        }
    }

    fn cell_range(&self, circle: &Circle) -> Vec<(i64, i64)> {
        let size = self.cell_size;
        let min_x = ((circle.center.x - circle.radius) / size).floor() as i64;
        let max_x = ((circle.center.x + circle.radius) / size).floor() as i64;
        let min_y = ((circle.center.y - circle.radius) / size).floor() as i64;
        let max_y = ((circle.center.y + circle.radius) / size).floor() as i64;

        let mut cells = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                cells.push((cx, cy));
            }
        }
        cells
    }

    pub fn insert(&mut self, circle: Circle) {
        let idx = self.circles.len();
        self.circles.push(circle);
        for cell in self.cell_range(&circle) {
            self.cells.entry(cell).or_default().push(idx);
        }
    }

    /// Circles sharing a cell with `circle`. May include false positives.
    pub fn query(&self, circle: &Circle) -> Vec<Circle> {
        let mut seen: Vec<usize> = Vec::new();
        for cell in self.cell_range(circle) {
            if let Some(indices) = self.cells.get(&cell) {
                seen.extend_from_slice(indices);
            }
        }
        seen.sort_unstable();
        seen.dedup();
        seen.into_iter().map(|i| self.circles[i]).collect()
    }

    pub fn overlaps_any(&self, circle: &Circle, epsilon: f64) -> bool {
        self.query(circle).iter().any(|c| circle.overlaps(c, epsilon))
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }
}
