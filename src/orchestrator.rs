//! Debounced layout triggers.
//!
//! The host feeds viewport changes, domain events and the current time in
//! milliseconds; `poll` says what, if anything, is due. Nothing here sleeps or
//! owns a timer, so the same code runs under a browser `setInterval` and in
//! tests with a fake clock.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;
use crate::error::LayoutError;
use crate::model::Viewport;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainEvent {
    ItemAdded,
    /// A listing was bumped.
    ItemPromoted,
    ItemMoved,
}

impl FromStr for DomainEvent {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "added" | "item-added" | "item_added" => Ok(DomainEvent::ItemAdded),
            "promoted" | "bumped" | "item-promoted" | "item_promoted" => Ok(DomainEvent::ItemPromoted),
            "moved" | "item-moved" | "item_moved" => Ok(DomainEvent::ItemMoved),
            _ => Err(LayoutError::UnknownEvent(s.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Rank or viewport changed: place everything again.
    Relayout,
    /// Only separate overlapping bubbles where they are.
    OverlapScan,
}

#[derive(Debug, Clone)]
pub struct ResizeOrchestrator {
    timing: TimingConfig,
    pending_viewport: Option<Viewport>,
    relayout_due: Option<f64>,
    scan_due: Option<f64>,
    next_tick: Option<f64>,
    stopped: bool,
}

impl ResizeOrchestrator {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            pending_viewport: None,
            relayout_due: None,
            scan_due: None,
            next_tick: None,
            stopped: false,
        }
    }

    /// Start the periodic overlap tick.
    pub fn start(&mut self, now_ms: f64) {
        if self.stopped {
            return;
        }
        self.next_tick = Some(now_ms + self.timing.overlap_tick_ms);
    }

    /// Restarts the resize window; only the last viewport of a burst is kept.
    pub fn on_resize(&mut self, viewport: Viewport, now_ms: f64) {
        if self.stopped {
            return;
        }
        self.pending_viewport = Some(viewport);
        self.relayout_due = Some(now_ms + self.timing.resize_debounce_ms);
    }

    pub fn on_event(&mut self, event: DomainEvent, now_ms: f64) {
        if self.stopped {
            return;
        }
        let due = Some(now_ms + self.timing.event_debounce_ms);
        match event {
            DomainEvent::ItemAdded | DomainEvent::ItemPromoted => self.relayout_due = due,
            // Re-placing would undo the move.
            DomainEvent::ItemMoved => self.scan_due = due,
        }
    }

    pub fn poll(&mut self, now_ms: f64) -> Option<Trigger> {
        if self.stopped {
            return None;
        }
        let due = |deadline: Option<f64>| deadline.is_some_and(|t| t <= now_ms);

        let trigger = if due(self.relayout_due) {
            // A relayout runs the overlap pass too.
            self.relayout_due = None;
            self.scan_due = None;
            Trigger::Relayout
        } else if due(self.scan_due) || due(self.next_tick) {
            self.scan_due = None;
            Trigger::OverlapScan
        } else {
            return None;
        };

        if self.next_tick.is_some() {
            self.next_tick = Some(now_ms + self.timing.overlap_tick_ms);
        }
        Some(trigger)
    }

    /// The viewport from the most recent resize, once.
    pub fn take_viewport(&mut self) -> Option<Viewport> {
        self.pending_viewport.take()
    }

    /// Earliest pending deadline, for hosts that schedule precisely.
    pub fn next_deadline(&self) -> Option<f64> {
        [self.relayout_due, self.scan_due, self.next_tick]
            .into_iter()
            .flatten()
            .reduce(f64::min)
    }

    /// Clear every pending deadline. Terminal.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.pending_viewport = None;
        self.relayout_due = None;
        self.scan_due = None;
        self.next_tick = None;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
