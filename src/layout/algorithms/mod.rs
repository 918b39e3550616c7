//! Placement strategies for bubbles.
//!
//! - `grid`: ranked desktop grid and the fixed-column mobile grid
//! - `spiral`: golden-angle spiral around the viewport center

mod grid;
mod spiral;

pub use grid::{GridLayout, MobileGridLayout, desktop_columns, layout_grid, layout_mobile_grid, mobile_scale};
pub use spiral::{SpiralLayout, golden_angle, layout_spiral, spiral_point};
