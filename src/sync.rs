//! Model/view position reconciliation.
//!
//! The hosting model (an [`ItemSource`]) owns bubble centers. The rendered
//! view (a [`RenderedView`]) holds one CSS transform per bubble and may be
//! written directly by the layout pass. Two directions:
//!
//! - model -> view: [`PositionSync::apply_model_to_view`] writes transforms and
//!   arms a one-shot flag so the render it causes is not read straight back.
//! - view -> model: [`PositionSync::read_view_into_model`] parses transforms and
//!   batches every center that drifted past a pixel threshold into a single
//!   `apply_positions` call.
//!
//! Both run under [`LayoutState`], which allows one reconciliation at a time:
//! a request arriving mid-pass is dropped, not queued.
//!
//! Transforms are `translate(Xpx, Ypx)` with the bubble *center*, optionally
//! followed by `scale(s)`; the rendering layer sets `transform-origin` so that
//! holds.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::layout::DesktopPreference;
use crate::model::{Item, ItemId, LayoutMode, Placement, Point};

/// The authoritative model. `apply_positions` is its only write path.
pub trait ItemSource {
    fn items(&self) -> Vec<Item>;
    fn apply_positions(&mut self, updates: &HashMap<ItemId, Point>);
}

impl ItemSource for Vec<Item> {
    fn items(&self) -> Vec<Item> {
        self.clone()
    }

    fn apply_positions(&mut self, updates: &HashMap<ItemId, Point>) {
        for item in self.iter_mut() {
            if let Some(p) = updates.get(&item.id) {
                item.x = p.x;
                item.y = p.y;
            }
        }
    }
}

/// The rendered representation.
pub trait RenderedView {
    /// `None` when the bubble has no rendered element yet.
    fn read_transform(&self, id: &ItemId) -> Option<String>;
    /// Returns false when the bubble has no rendered element yet.
    fn write_transform(&mut self, id: &ItemId, transform: &str) -> bool;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Arranging,
    Syncing,
    Unmounted,
}

/// Per-engine layout and synchronization state.
#[derive(Debug, Clone)]
pub struct LayoutState {
    pub mode: LayoutMode,
    pub desktop_preference: DesktopPreference,
    phase: SyncPhase,
    suppress_next_model_sync: bool,
    last_computed_positions: HashMap<ItemId, Point>,
    size_scale: f64,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            mode: LayoutMode::DesktopGrid,
            desktop_preference: DesktopPreference::Grid,
            phase: SyncPhase::Idle,
            suppress_next_model_sync: false,
            last_computed_positions: HashMap::new(),
            size_scale: 1.0,
        }
    }
}

impl LayoutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// True while a pass is in flight.
    pub fn arranging(&self) -> bool {
        self.phase != SyncPhase::Idle
    }

    /// Take the lock for `phase`. Fails without side effects if not idle.
    pub fn try_begin(&mut self, phase: SyncPhase) -> Result<()> {
        match self.phase {
            SyncPhase::Idle => {
                self.phase = phase;
                Ok(())
            }
            SyncPhase::Unmounted => Err(LayoutError::Unmounted),
            _ => Err(LayoutError::Busy),
        }
    }

    /// Move from `Arranging` to `Syncing` within one pass.
    pub fn enter_syncing(&mut self) {
        if self.phase == SyncPhase::Arranging {
            self.phase = SyncPhase::Syncing;
        }
    }

    /// Release the lock. Must run on every exit path of a pass.
    pub fn finish(&mut self) {
        if self.phase != SyncPhase::Unmounted {
            self.phase = SyncPhase::Idle;
        }
    }

    pub fn unmount(&mut self) {
        self.phase = SyncPhase::Unmounted;
        self.suppress_next_model_sync = false;
    }

    pub fn suppress_next_model_sync(&self) -> bool {
        self.suppress_next_model_sync
    }

    pub fn arm_suppress(&mut self) {
        self.suppress_next_model_sync = true;
    }

    /// Clear the one-shot flag, returning whether it was set.
    pub fn take_suppress(&mut self) -> bool {
        std::mem::take(&mut self.suppress_next_model_sync)
    }

    pub fn last_computed(&self, id: &ItemId) -> Option<Point> {
        self.last_computed_positions.get(id).copied()
    }

    pub fn last_computed_positions(&self) -> &HashMap<ItemId, Point> {
        &self.last_computed_positions
    }

    /// Replace the record with exactly `positions`, dropping vanished items.
    pub fn record_positions(&mut self, positions: &HashMap<ItemId, Point>) {
        self.last_computed_positions = positions.clone();
    }

    pub fn size_scale(&self) -> f64 {
        self.size_scale
    }

    pub fn set_size_scale(&mut self, scale: f64) {
        self.size_scale = scale;
    }
}

pub fn format_transform(center: Point, scale: f64) -> String {
    if scale == 1.0 {
        format!("translate({:.2}px, {:.2}px)", center.x, center.y)
    } else {
        format!("translate({:.2}px, {:.2}px) scale({})", center.x, center.y, scale)
    }
}

fn parse_length(component: &str) -> Option<f64> {
    let component = component.trim();
    let number = component.strip_suffix("px").unwrap_or(component).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Center from a `translate(...)` / `translate3d(...)` transform.
pub fn parse_transform(transform: &str) -> Option<Point> {
    let start = transform
        .find("translate3d(")
        .map(|i| i + "translate3d(".len())
        .or_else(|| transform.find("translate(").map(|i| i + "translate(".len()))?;
    let rest = &transform[start..];
    let args = &rest[..rest.find(')')?];

    let mut parts = args.split(',');
    let x = parse_length(parts.next()?)?;
    let y = parse_length(parts.next()?)?;
    Some(Point { x, y })
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ApplyStats {
    pub written: usize,
    /// Bubbles without a rendered element; retried next cycle.
    pub missing: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ReadBack {
    pub positions: HashMap<ItemId, Point>,
    pub missing: usize,
    pub malformed: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Committed {
        updated: usize,
        missing: usize,
        malformed: usize,
    },
    /// The render was caused by our own write.
    Suppressed,
    /// Another pass held the lock.
    Dropped,
}

#[derive(Debug, Clone)]
pub struct PositionSync {
    threshold_px: f64,
}

impl PositionSync {
    pub fn new(threshold_px: f64) -> Self {
        Self { threshold_px }
    }

    pub fn apply_model_to_view<V: RenderedView>(
        &self,
        state: &mut LayoutState,
        view: &mut V,
        placements: &[Placement],
    ) -> ApplyStats {
        state.arm_suppress();
        let scale = state.size_scale();

        let mut stats = ApplyStats::default();
        for p in placements {
            if view.write_transform(&p.id, &format_transform(p.center, scale)) {
                stats.written += 1;
            } else {
                log::trace!("{}", LayoutError::MissingElement(p.id.clone()));
                stats.missing += 1;
            }
        }
        stats
    }

    /// Parse the rendered center of every item that has a usable transform.
    pub fn read_rendered<V: RenderedView>(&self, view: &V, items: &[Item]) -> ReadBack {
        let mut back = ReadBack::default();
        for item in items {
            let Some(transform) = view.read_transform(&item.id) else {
                back.missing += 1;
                continue;
            };
            match parse_transform(&transform) {
                Some(p) => {
                    back.positions.insert(item.id.clone(), p);
                }
                None => {
                    log::debug!(
                        "{}",
                        LayoutError::MalformedPosition {
                            id: item.id.clone(),
                            transform,
                        }
                    );
                    back.malformed += 1;
                }
            }
        }
        back
    }

    /// Write centers further than `threshold_px` from the model in one batch
    /// and record them. Items absent from `positions` keep their model value.
    ///
    /// Computed layouts commit with a zero threshold; only the read-back of
    /// rendered transforms tolerates sub-pixel drift.
    pub fn commit<S: ItemSource>(
        &self,
        state: &mut LayoutState,
        source: &mut S,
        items: &[Item],
        positions: &HashMap<ItemId, Point>,
        threshold_px: f64,
    ) -> usize {
        let mut updates: HashMap<ItemId, Point> = HashMap::new();
        let mut record: HashMap<ItemId, Point> = HashMap::with_capacity(items.len());

        for item in items {
            let model = item.center();
            match positions.get(&item.id) {
                Some(&p) if p.distance(&model) > threshold_px => {
                    updates.insert(item.id.clone(), p);
                    record.insert(item.id.clone(), p);
                }
                _ => {
                    record.insert(item.id.clone(), model);
                }
            }
        }

        if !updates.is_empty() {
            source.apply_positions(&updates);
        }
        state.record_positions(&record);
        updates.len()
    }

    /// Read the view back into the model, unless a pass holds the lock.
    pub fn read_view_into_model<V: RenderedView, S: ItemSource>(
        &self,
        state: &mut LayoutState,
        view: &V,
        source: &mut S,
    ) -> SyncOutcome {
        if let Err(e) = state.try_begin(SyncPhase::Syncing) {
            log::debug!("view sync dropped: {e}");
            return SyncOutcome::Dropped;
        }

        let items = source.items();
        let back = self.read_rendered(view, &items);
        let updated = self.commit(state, source, &items, &back.positions, self.threshold_px);
        state.finish();

        SyncOutcome::Committed {
            updated,
            missing: back.missing,
            malformed: back.malformed,
        }
    }

    /// Host hook for "the view re-rendered".
    pub fn on_view_rendered<V: RenderedView, S: ItemSource>(
        &self,
        state: &mut LayoutState,
        view: &V,
        source: &mut S,
    ) -> SyncOutcome {
        if state.phase() != SyncPhase::Unmounted && state.take_suppress() {
            return SyncOutcome::Suppressed;
        }
        self.read_view_into_model(state, view, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryView;

    fn placement(id: &str, x: f64, y: f64) -> Placement {
        Placement {
            id: ItemId::from(id),
            center: Point::new(x, y),
            diameter: 60.0,
            pinned: false,
        }
    }

    #[test]
    fn test_transform_round_trip() {
        let t = format_transform(Point::new(12.5, 300.0), 1.0);
        assert_eq!(t, "translate(12.50px, 300.00px)");
        assert_eq!(parse_transform(&t), Some(Point::new(12.5, 300.0)));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(parse_transform("translate3d(10px, 20px, 0px)"), Some(Point::new(10.0, 20.0)));
        assert_eq!(parse_transform("translate(4, 5) scale(0.85)"), Some(Point::new(4.0, 5.0)));
        assert_eq!(parse_transform("  translate( -3.5px ,7px )"), Some(Point::new(-3.5, 7.0)));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse_transform(""), None);
        assert_eq!(parse_transform("none"), None);
        assert_eq!(parse_transform("translate(10px)"), None);
        assert_eq!(parse_transform("translate(10%, 20%)"), None);
        assert_eq!(parse_transform("translate(NaNpx, 1px)"), None);
        assert_eq!(parse_transform("translate(1px, 2px"), None);
    }

    #[test]
    fn test_apply_arms_suppress_and_skips_missing() {
        let sync = PositionSync::new(1.0);
        let mut state = LayoutState::new();
        let mut view = MemoryView::mounted(&["a"]);
        let stats = sync.apply_model_to_view(&mut state, &mut view, &[placement("a", 10.0, 20.0), placement("b", 1.0, 1.0)]);
        assert_eq!(stats, ApplyStats { written: 1, missing: 1 });
        assert!(state.suppress_next_model_sync());
        assert_eq!(view.transform("a"), Some("translate(10.00px, 20.00px)"));
    }

    #[test]
    fn test_read_view_batches_drifted_items() {
        let sync = PositionSync::new(1.0);
        let mut state = LayoutState::new();
        let mut source = vec![
            Item::new("a", 60.0, 1).at(100.0, 100.0),
            Item::new("b", 60.0, 1).at(200.0, 100.0),
            Item::new("c", 60.0, 1).at(300.0, 100.0),
            Item::new("d", 60.0, 1).at(400.0, 100.0),
        ];
        let mut view = MemoryView::mounted(&["a", "b", "c"]);
        view.set("a", "translate(150px, 100px)");
        view.set("b", "translate(200.4px, 100px)"); // under threshold
        view.set("c", "matrix(garbage)");

        let outcome = sync.read_view_into_model(&mut state, &view, &mut source);
        assert_eq!(outcome, SyncOutcome::Committed { updated: 1, missing: 1, malformed: 1 });
        assert_eq!(source[0].center(), Point::new(150.0, 100.0));
        assert_eq!(source[1].center(), Point::new(200.0, 100.0));
        assert_eq!(source[2].center(), Point::new(300.0, 100.0));
        assert_eq!(state.last_computed(&ItemId::from("a")), Some(Point::new(150.0, 100.0)));
        assert_eq!(state.last_computed(&ItemId::from("d")), Some(Point::new(400.0, 100.0)));
        assert_eq!(state.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_commit_threshold_applies_only_when_asked() {
        let sync = PositionSync::new(1.0);
        let mut state = LayoutState::new();
        let mut source = vec![Item::new("a", 60.0, 1).at(100.0, 100.0)];
        let items = source.clone();
        let positions = HashMap::from([(ItemId::from("a"), Point::new(100.5, 100.0))]);

        assert_eq!(sync.commit(&mut state, &mut source, &items, &positions, 1.0), 0);
        assert_eq!(source[0].center(), Point::new(100.0, 100.0));

        assert_eq!(sync.commit(&mut state, &mut source, &items, &positions, 0.0), 1);
        assert_eq!(source[0].center(), Point::new(100.5, 100.0));
        assert_eq!(state.last_computed_positions(), &positions);
    }

    #[test]
    fn test_read_view_dropped_while_arranging() {
        let sync = PositionSync::new(1.0);
        let mut state = LayoutState::new();
        state.try_begin(SyncPhase::Arranging).unwrap();
        let mut source = vec![Item::new("a", 60.0, 1)];
        let mut view = MemoryView::mounted(&["a"]);
        view.set("a", "translate(50px, 50px)");

        assert_eq!(sync.read_view_into_model(&mut state, &view, &mut source), SyncOutcome::Dropped);
        assert_eq!(source[0].center(), Point::new(0.0, 0.0));
        // The lock belongs to the arranging pass, not to the dropped request.
        assert_eq!(state.phase(), SyncPhase::Arranging);
    }

    #[test]
    fn test_render_after_apply_is_suppressed_once() {
        let sync = PositionSync::new(1.0);
        let mut state = LayoutState::new();
        let mut source = vec![Item::new("a", 60.0, 1)];
        let mut view = MemoryView::mounted(&["a"]);
        sync.apply_model_to_view(&mut state, &mut view, &[placement("a", 80.0, 90.0)]);

        assert_eq!(sync.on_view_rendered(&mut state, &view, &mut source), SyncOutcome::Suppressed);
        assert_eq!(source[0].center(), Point::new(0.0, 0.0));
        // Next render is a real one.
        let outcome = sync.on_view_rendered(&mut state, &view, &mut source);
        assert!(matches!(outcome, SyncOutcome::Committed { updated: 1, .. }));
        assert_eq!(source[0].center(), Point::new(80.0, 90.0));
    }

    #[test]
    fn test_unmounted_state_is_terminal() {
        let mut state = LayoutState::new();
        state.unmount();
        assert!(matches!(state.try_begin(SyncPhase::Arranging), Err(LayoutError::Unmounted)));
        state.finish();
        assert_eq!(state.phase(), SyncPhase::Unmounted);
    }

    #[test]
    fn test_busy_state_rejects_second_pass() {
        let mut state = LayoutState::new();
        state.try_begin(SyncPhase::Arranging).unwrap();
        assert!(matches!(state.try_begin(SyncPhase::Arranging), Err(LayoutError::Busy)));
        state.enter_syncing();
        assert_eq!(state.phase(), SyncPhase::Syncing);
        state.finish();
        assert!(!state.arranging());
    }
}
