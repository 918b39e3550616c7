//! Output types for the JS host.
//!
//! These structs are serialized to JSON and handed back across the WASM
//! boundary.

use serde::Serialize;

use crate::engine::CycleOutcome;
use crate::error::LayoutError;
use crate::layout::Layout;
use crate::model::{LayoutMode, Placement};

/// One positioned bubble
#[derive(Debug, Clone, Serialize)]
pub struct PositionOutput {
    pub id: String,
    /// Center, CSS pixels
    pub x: f64,
    pub y: f64,
    /// Rendered diameter (mobile scale applied)
    pub diameter: f64,
    pub pinned: bool,
}

impl From<&Placement> for PositionOutput {
    fn from(p: &Placement) -> Self {
        Self {
            id: p.id.0.clone(),
            x: p.center.x,
            y: p.center.y,
            diameter: p.diameter,
            pinned: p.pinned,
        }
    }
}

/// Error information for the host
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl From<&LayoutError> for ErrorInfo {
    fn from(e: &LayoutError) -> Self {
        Self { message: e.to_string() }
    }
}

/// Result of a one-shot layout computation
#[derive(Debug, Clone, Serialize)]
pub struct LayoutOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<LayoutMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_scale: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<PositionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl LayoutOutput {
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            mode: Some(layout.mode),
            columns: layout.columns,
            size_scale: Some(layout.size_scale),
            positions: layout.placements.iter().map(PositionOutput::from).collect(),
            error: None,
        }
    }

    pub fn from_error(e: &LayoutError) -> Self {
        Self {
            mode: None,
            columns: None,
            size_scale: None,
            positions: vec![],
            error: Some(ErrorInfo::from(e)),
        }
    }
}

/// A cycle outcome, or an error that kept it from running
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CycleOutput {
    Outcome(CycleOutcome),
    Error { error: ErrorInfo },
}

impl From<CycleOutcome> for CycleOutput {
    fn from(outcome: CycleOutcome) -> Self {
        CycleOutput::Outcome(outcome)
    }
}

impl From<&LayoutError> for CycleOutput {
    fn from(e: &LayoutError) -> Self {
        CycleOutput::Error { error: ErrorInfo::from(e) }
    }
}

/// Serialize for the host; serialization of these types cannot fail in
/// practice, but an error still produces valid JSON.
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("failed to serialize output: {e}");
        format!("{{\"error\":{{\"message\":{:?}}}}}", e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::layout::layout_items;
    use crate::model::{Item, Viewport};

    #[test]
    fn test_layout_output_shape() {
        let items = vec![Item::new("a", 80.0, 2), Item::new("b", 80.0, 1)];
        let layout = layout_items(&items, &Viewport::new(1280.0, 720.0, 0.0), LayoutMode::DesktopGrid, &EngineConfig::default())
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&to_json(&LayoutOutput::from_layout(&layout))).unwrap();
        assert_eq!(json["mode"], "desktop_grid");
        assert_eq!(json["columns"], 8);
        assert_eq!(json["positions"][0]["id"], "a");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_output_shape() {
        let e = LayoutError::UnknownMode("hex".into());
        let json: serde_json::Value = serde_json::from_str(&to_json(&LayoutOutput::from_error(&e))).unwrap();
        assert!(json["error"]["message"].as_str().unwrap().contains("hex"));
        assert!(json.get("positions").is_none());
    }

    #[test]
    fn test_cycle_output_tags() {
        let skipped = CycleOutput::from(CycleOutcome::Skipped { reason: "no viewport".into() });
        let json: serde_json::Value = serde_json::from_str(&to_json(&skipped)).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "no viewport");

        let err = CycleOutput::from(&LayoutError::Unmounted);
        let json: serde_json::Value = serde_json::from_str(&to_json(&err)).unwrap();
        assert!(json["error"]["message"].is_string());
    }
}
