use crate::model::ItemId;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Degenerate viewport: {width}x{height} (top padding {top_padding})")]
    DegenerateViewport {
        width: f64,
        height: f64,
        top_padding: f64,
    },

    #[error("No rendered element for item '{0}'")]
    MissingElement(ItemId),

    #[error("Malformed rendered position for item '{id}': {transform:?}")]
    MalformedPosition { id: ItemId, transform: String },

    #[error("Overlaps remain after {iterations} iterations ({remaining} pairs)")]
    NonConvergentOverlap { iterations: usize, remaining: usize },

    #[error("A layout pass is already in flight")]
    Busy,

    #[error("Layout engine is unmounted")]
    Unmounted,

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown domain event: {0}")]
    UnknownEvent(String),

    #[error("Unknown layout mode: {0}")]
    UnknownMode(String),
}
