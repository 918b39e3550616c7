//! The layout cycle.
//!
//! One cycle runs `Idle -> Arranging -> Syncing -> Idle`:
//!
//! 1. rank and place (relayout) or read the rendered positions (overlap scan),
//! 2. write positions to the view,
//! 3. resolve overlaps and write again if anything moved,
//! 4. commit every changed center to the model in one batch.
//!
//! Each phase completes before the next starts. Any failure is absorbed into
//! the returned [`CycleOutcome`]; nothing reaches the host as a panic.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::layout::{
    DesktopPreference, OverlapReport, check_viewport, rank_items, resolve_overlaps, select_mode, strategy_for,
};
use crate::model::{Item, ItemId, LayoutMode, Placement, Point, Viewport};
use crate::orchestrator::{DomainEvent, ResizeOrchestrator, Trigger};
use crate::sync::{ItemSource, LayoutState, PositionSync, RenderedView, SyncOutcome, SyncPhase};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub trigger: Trigger,
    pub mode: LayoutMode,
    pub columns: Option<usize>,
    pub placed: usize,
    /// Bubbles with no rendered element.
    pub missing: usize,
    /// Bubbles whose rendered transform could not be parsed.
    pub malformed: usize,
    /// Model updates written back.
    pub committed: usize,
    pub overlap: OverlapReport,
    /// Overlaps remain; the host may show an overflow indicator.
    pub overflow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed(CycleReport),
    Skipped { reason: String },
}

impl CycleOutcome {
    fn skipped(reason: impl ToString) -> Self {
        CycleOutcome::Skipped { reason: reason.to_string() }
    }

    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            CycleOutcome::Skipped { .. } => None,
        }
    }
}

pub struct BubbleEngine<S: ItemSource, V: RenderedView> {
    cfg: EngineConfig,
    state: LayoutState,
    sync: PositionSync,
    orchestrator: ResizeOrchestrator,
    viewport: Option<Viewport>,
    source: S,
    view: V,
}

impl<S: ItemSource, V: RenderedView> BubbleEngine<S, V> {
    pub fn new(cfg: EngineConfig, source: S, view: V) -> Self {
        Self {
            sync: PositionSync::new(cfg.sync.threshold_px),
            orchestrator: ResizeOrchestrator::new(cfg.timing.clone()),
            state: LayoutState::new(),
            viewport: None,
            cfg,
            source,
            view,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn is_unmounted(&self) -> bool {
        self.state.phase() == SyncPhase::Unmounted
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.orchestrator.next_deadline()
    }

    /// First layout: runs immediately and starts the overlap tick.
    pub fn mount(&mut self, viewport: Viewport, now_ms: f64) -> CycleOutcome {
        self.viewport = Some(viewport);
        self.orchestrator.start(now_ms);
        self.relayout()
    }

    pub fn on_resize(&mut self, viewport: Viewport, now_ms: f64) {
        self.orchestrator.on_resize(viewport, now_ms);
    }

    pub fn on_event(&mut self, event: DomainEvent, now_ms: f64) {
        self.orchestrator.on_event(event, now_ms);
    }

    /// Run whatever is due at `now_ms`.
    pub fn poll(&mut self, now_ms: f64) -> Option<CycleOutcome> {
        let trigger = self.orchestrator.poll(now_ms)?;
        if let Some(viewport) = self.orchestrator.take_viewport() {
            self.viewport = Some(viewport);
        }
        Some(match trigger {
            Trigger::Relayout => self.relayout(),
            Trigger::OverlapScan => self.overlap_scan(),
        })
    }

    /// Switch to the spiral and place immediately.
    pub fn arrange_spiral(&mut self) -> CycleOutcome {
        self.state.desktop_preference = DesktopPreference::Spiral;
        self.place_all(Trigger::Relayout)
    }

    /// Back to the desktop grid.
    pub fn arrange_grid(&mut self) -> CycleOutcome {
        self.state.desktop_preference = DesktopPreference::Grid;
        self.place_all(Trigger::Relayout)
    }

    /// The host rendered the view; reconcile unless we caused it.
    pub fn on_view_rendered(&mut self) -> SyncOutcome {
        self.sync.on_view_rendered(&mut self.state, &self.view, &mut self.source)
    }

    /// Explicit view -> model commit.
    pub fn read_view_into_model(&mut self) -> SyncOutcome {
        self.sync.read_view_into_model(&mut self.state, &self.view, &mut self.source)
    }

    pub fn unmount(&mut self) {
        self.orchestrator.stop();
        self.state.unmount();
        log::debug!("bubble layout unmounted");
    }

    /// Relayout for a trigger. The spiral is only placed on request, so while it
    /// is active a triggered relayout just separates overlaps.
    fn relayout(&mut self) -> CycleOutcome {
        let Some(viewport) = self.viewport else {
            return CycleOutcome::skipped("no viewport");
        };
        let next = select_mode(&viewport, self.state.desktop_preference, &self.cfg);
        if next == LayoutMode::DesktopSpiral && self.state.mode == LayoutMode::DesktopSpiral {
            return self.overlap_scan();
        }
        self.place_all(Trigger::Relayout)
    }

    fn begin(&mut self) -> Result<Viewport, CycleOutcome> {
        let Some(viewport) = self.viewport else {
            return Err(CycleOutcome::skipped("no viewport"));
        };
        if let Err(e) = check_viewport(&viewport) {
            log::warn!("layout pass skipped: {e}");
            return Err(CycleOutcome::skipped(e));
        }
        if let Err(e) = self.state.try_begin(SyncPhase::Arranging) {
            log::debug!("layout pass skipped: {e}");
            return Err(CycleOutcome::skipped(e));
        }
        Ok(viewport)
    }

    fn place_all(&mut self, trigger: Trigger) -> CycleOutcome {
        let viewport = match self.begin() {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };

        let mode = select_mode(&viewport, self.state.desktop_preference, &self.cfg);
        self.state.mode = mode;

        let items = self.source.items();
        let ranked = rank_items(&items);
        let layout = strategy_for(mode).place(&ranked, &viewport, &self.cfg);
        self.state.set_size_scale(layout.size_scale);

        let applied = self.sync.apply_model_to_view(&mut self.state, &mut self.view, &layout.placements);
        // Continue from what actually got rendered.
        let back = self.sync.read_rendered(&self.view, &ranked);
        let mut placements = layout.placements;
        for p in placements.iter_mut() {
            if let Some(&rendered) = back.positions.get(&p.id) {
                p.center = rendered;
            }
        }

        let report = self.resolve_and_commit(&viewport, trigger, layout.columns, &items, placements, applied.missing, back.malformed);
        self.state.finish();
        CycleOutcome::Completed(report)
    }

    fn overlap_scan(&mut self) -> CycleOutcome {
        let viewport = match self.begin() {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };

        let items = self.source.items();
        let ranked = rank_items(&items);
        let back = self.sync.read_rendered(&self.view, &ranked);
        let scale = self.state.size_scale();
        let placements: Vec<Placement> = ranked
            .iter()
            .map(|item| Placement {
                id: item.id.clone(),
                center: back.positions.get(&item.id).copied().unwrap_or_else(|| item.center()),
                diameter: item.size * scale,
                pinned: item.pinned,
            })
            .collect();

        let report = self.resolve_and_commit(&viewport, Trigger::OverlapScan, None, &items, placements, back.missing, back.malformed);
        self.state.finish();
        CycleOutcome::Completed(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_and_commit(
        &mut self,
        viewport: &Viewport,
        trigger: Trigger,
        columns: Option<usize>,
        items: &[Item],
        mut placements: Vec<Placement>,
        missing: usize,
        malformed: usize,
    ) -> CycleReport {
        let overlap = resolve_overlaps(&mut placements, viewport, &self.cfg.overlap);
        if overlap.moved > 0 {
            self.sync.apply_model_to_view(&mut self.state, &mut self.view, &placements);
        }
        if let Err(e) = overlap.check() {
            log::warn!("{e}");
        }

        self.state.enter_syncing();
        let positions: HashMap<ItemId, Point> = placements.iter().map(|p| (p.id.clone(), p.center)).collect();
        let committed = self.sync.commit(&mut self.state, &mut self.source, items, &positions, 0.0);

        log::debug!(
            "{:?} pass: mode={} placed={} moved={} committed={}",
            trigger,
            self.state.mode.as_str(),
            placements.len(),
            overlap.moved,
            committed
        );

        CycleReport {
            trigger,
            mode: self.state.mode,
            columns,
            placed: placements.len(),
            missing,
            malformed,
            committed,
            overlap,
            overflow: !overlap.converged,
        }
    }
}
