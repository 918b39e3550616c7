use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Stable identity of a listing bubble.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One listing bubble. `x`/`y` is the center and is owned by the hosting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Diameter in CSS pixels.
    pub size: f64,
    /// Net positive votes.
    #[serde(default)]
    pub score: i64,
    /// Promoted ("bumped") listings get placement priority regardless of score.
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Item {
    pub fn new(id: &str, size: f64, score: i64) -> Self {
        Self {
            id: ItemId::from(id),
            x: 0.0,
            y: 0.0,
            size,
            score,
            pinned: false,
            category: None,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn center(&self) -> Point {
        Point { x: self.x, y: self.y }
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }
}

/// Visible screen area. The band `[0, top_padding)` is reserved for header UI.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub top_padding: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, top_padding: f64) -> Self {
        Self { width, height, top_padding }
    }

    /// A viewport with no usable placement area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.height > self.top_padding)
    }

    /// Center of the placement band below the header.
    pub fn center(&self) -> Point {
        Point {
            x: self.width / 2.0,
            y: self.top_padding + (self.height - self.top_padding) / 2.0,
        }
    }

    pub fn contains_circle(&self, center: Point, radius: f64) -> bool {
        center.x - radius >= 0.0
            && center.x + radius <= self.width
            && center.y - radius >= self.top_padding
            && center.y + radius <= self.height
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    Mobile,
    DesktopGrid,
    DesktopSpiral,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Mobile => "mobile",
            LayoutMode::DesktopGrid => "desktop_grid",
            LayoutMode::DesktopSpiral => "desktop_spiral",
        }
    }
}

impl FromStr for LayoutMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(LayoutMode::Mobile),
            "grid" | "desktop_grid" | "desktop-grid" => Ok(LayoutMode::DesktopGrid),
            "spiral" | "desktop_spiral" | "desktop-spiral" => Ok(LayoutMode::DesktopSpiral),
            _ => Err(LayoutError::UnknownMode(s.to_string())),
        }
    }
}

/// Computed center and rendered diameter for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: ItemId,
    pub center: Point,
    pub diameter: f64,
    pub pinned: bool,
}

impl Placement {
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }
}
