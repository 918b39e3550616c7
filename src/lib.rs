//! Bubble layout engine.
//!
//! Places ranked listing bubbles on screen as a responsive grid (mobile and
//! desktop) or a golden-angle spiral, separates overlaps, keeps every bubble
//! inside the viewport and reconciles positions between the hosting model and
//! the rendered view. The core is host-agnostic; `wasm` binds it to the DOM.

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod sync;
pub mod wasm;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine::{BubbleEngine, CycleOutcome, CycleReport};
pub use error::{LayoutError, Result};
pub use layout::{Layout, LayoutStrategy, layout_items};
pub use model::{Item, ItemId, LayoutMode, Placement, Point, Viewport};
pub use orchestrator::{DomainEvent, ResizeOrchestrator, Trigger};
pub use sync::{ItemSource, LayoutState, PositionSync, RenderedView, SyncOutcome, SyncPhase};
