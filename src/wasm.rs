//! WASM bindings for the bubble layout engine.
//!
//! Everything exposed to JavaScript via wasm-bindgen is defined here: console
//! logging, the DOM-backed view, the JS-backed item source and the
//! `BubbleLayout` class that owns the resize listener and the poll timer.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, Window};

use crate::config::EngineConfig;
use crate::engine::{BubbleEngine, CycleOutcome};
use crate::error::{LayoutError, Result};
use crate::layout::layout_items;
use crate::model::{Item, ItemId, LayoutMode, Point, Viewport};
use crate::orchestrator::DomainEvent;
use crate::output::{CycleOutput, LayoutOutput, to_json};
use crate::sync::{ItemSource, RenderedView};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

// Logging

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        if record.level() <= log::Level::Warn {
            console_error(&line);
        } else {
            console_log(&line);
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Route `log` records to the browser console. `level` is one of `off`,
/// `error`, `warn`, `info`, `debug`, `trace`; anything else means `info`.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    let filter = level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);
    // Already installed on a second call; only the level changes.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(filter);
}

// Browser helpers

fn window() -> Option<Window> {
    web_sys::window()
}

fn now_ms() -> f64 {
    window().and_then(|w| w.performance()).map(|p| p.now()).unwrap_or(0.0)
}

fn window_viewport(top_padding: f64) -> Option<Viewport> {
    let w = window()?;
    let width = w.inner_width().ok()?.as_f64()?;
    let height = w.inner_height().ok()?.as_f64()?;
    Some(Viewport::new(width, height, top_padding))
}

// DOM view

/// Bubble elements looked up by `id_prefix + item id`. The element's inline
/// `transform` is the rendered position.
pub struct DomView {
    document: Option<Document>,
    id_prefix: String,
}

impl DomView {
    pub fn new(id_prefix: &str) -> Self {
        Self {
            document: window().and_then(|w| w.document()),
            id_prefix: id_prefix.to_string(),
        }
    }

    fn element(&self, id: &ItemId) -> Option<HtmlElement> {
        self.document
            .as_ref()?
            .get_element_by_id(&format!("{}{}", self.id_prefix, id))?
            .dyn_into::<HtmlElement>()
            .ok()
    }
}

impl RenderedView for DomView {
    fn read_transform(&self, id: &ItemId) -> Option<String> {
        self.element(id)?.style().get_property_value("transform").ok()
    }

    fn write_transform(&mut self, id: &ItemId, transform: &str) -> bool {
        match self.element(id) {
            Some(el) => el.style().set_property("transform", transform).is_ok(),
            None => false,
        }
    }
}

// JS item source

/// Items owned on the Rust side, mirrored to the host through `on_commit`.
#[derive(Default)]
pub struct JsItemSource {
    items: Vec<Item>,
    on_commit: Option<js_sys::Function>,
}

impl JsItemSource {
    fn set_items(&mut self, items: Vec<Item>) {
        self.items = items;
    }
}

impl ItemSource for JsItemSource {
    fn items(&self) -> Vec<Item> {
        self.items.clone()
    }

    fn apply_positions(&mut self, updates: &HashMap<ItemId, Point>) {
        self.items.apply_positions(updates);

        let Some(callback) = &self.on_commit else {
            return;
        };
        let sorted: BTreeMap<&ItemId, &Point> = updates.iter().collect();
        let payload = JsValue::from_str(&to_json(&sorted));
        if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
            log::error!("on_commit callback failed: {e:?}");
        }
    }
}

// One-shot layout

/// Rank and place `items_json` for a viewport without touching the DOM.
/// Returns a `LayoutOutput` JSON document.
#[wasm_bindgen]
pub fn compute_layout(items_json: &str, width: f64, height: f64, top_padding: f64, mode: &str) -> String {
    let result = (|| -> Result<_> {
        let items: Vec<Item> = serde_json::from_str(items_json)?;
        let mode: LayoutMode = mode.parse()?;
        layout_items(&items, &Viewport::new(width, height, top_padding), mode, &EngineConfig::default())
    })();

    match result {
        Ok(layout) => to_json(&LayoutOutput::from_layout(&layout)),
        Err(e) => {
            console_error(&format!("Error computing layout: {e}"));
            to_json(&LayoutOutput::from_error(&e))
        }
    }
}

// Engine handle

type Engine = BubbleEngine<JsItemSource, DomView>;

type Shared<T> = Rc<RefCell<T>>;

/// Host state shared with the timer and listener closures.
#[derive(Default)]
struct Hooks {
    on_cycle: Option<js_sys::Function>,
    top_padding: f64,
}

fn report_cycle(hooks: &Shared<Hooks>, outcome: &CycleOutcome) {
    if let Some(report) = outcome.report() {
        if report.overflow {
            log::warn!("bubbles overflow the viewport ({} overlapping pairs)", report.overlap.remaining);
        }
    }
    let Ok(hooks) = hooks.try_borrow() else {
        return;
    };
    if let Some(callback) = &hooks.on_cycle {
        let payload = JsValue::from_str(&to_json(outcome));
        if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
            log::error!("on_cycle callback failed: {e:?}");
        }
    }
}

/// Run `f` against the engine. A re-entrant call from inside a host callback
/// finds the engine borrowed and is dropped as busy.
fn with_engine<R>(engine: &Shared<Engine>, f: impl FnOnce(&mut Engine) -> R) -> Result<R> {
    let mut engine = engine.try_borrow_mut().map_err(|_| LayoutError::Busy)?;
    Ok(f(&mut engine))
}

fn poll_engine(engine: &Shared<Engine>, hooks: &Shared<Hooks>, now: f64) -> Option<CycleOutcome> {
    match with_engine(engine, |e| e.poll(now)) {
        Ok(outcome) => {
            if let Some(outcome) = &outcome {
                report_cycle(hooks, outcome);
            }
            outcome
        }
        Err(e) => {
            log::debug!("poll skipped: {e}");
            None
        }
    }
}

#[wasm_bindgen]
pub struct BubbleLayout {
    engine: Shared<Engine>,
    hooks: Shared<Hooks>,
    resize_listener: Option<Closure<dyn FnMut()>>,
    poll_timer: Option<(i32, Closure<dyn FnMut()>)>,
}

#[wasm_bindgen]
impl BubbleLayout {
    /// `config_json` may be empty or any subset of the engine configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> std::result::Result<BubbleLayout, JsError> {
        let cfg = EngineConfig::from_json(config_json)?;
        let view = DomView::new(&cfg.sync.element_id_prefix);
        Ok(Self {
            engine: Rc::new(RefCell::new(BubbleEngine::new(cfg, JsItemSource::default(), view))),
            hooks: Rc::new(RefCell::new(Hooks::default())),
            resize_listener: None,
            poll_timer: None,
        })
    }

    /// Replace the item list. Positions in the JSON are the current model
    /// positions; call `notify` to schedule a relayout.
    pub fn set_items(&self, items_json: &str) -> std::result::Result<(), JsError> {
        let items: Vec<Item> = serde_json::from_str(items_json).map_err(LayoutError::from)?;
        with_engine(&self.engine, |e| e.source_mut().set_items(items))?;
        Ok(())
    }

    /// Current model items as JSON.
    pub fn items(&self) -> String {
        match with_engine(&self.engine, |e| to_json(&e.source().items)) {
            Ok(json) => json,
            Err(e) => to_json(&CycleOutput::from(&e)),
        }
    }

    /// Called with a JSON object `{id: {x, y}}` after every model commit.
    pub fn set_on_commit(&self, callback: js_sys::Function) -> std::result::Result<(), JsError> {
        with_engine(&self.engine, |e| e.source_mut().on_commit = Some(callback))?;
        Ok(())
    }

    /// Called with the cycle outcome JSON after every timer-driven pass.
    pub fn set_on_cycle(&self, callback: js_sys::Function) {
        if let Ok(mut hooks) = self.hooks.try_borrow_mut() {
            hooks.on_cycle = Some(callback);
        }
    }

    /// Lay out immediately, then follow window resizes and poll the
    /// debounce timers every `timing.poll_interval_ms`.
    pub fn mount(&mut self, width: f64, height: f64, top_padding: f64) -> String {
        match with_engine(&self.engine, |e| e.is_unmounted()) {
            Ok(false) => {}
            Ok(true) => return to_json(&CycleOutput::from(&LayoutError::Unmounted)),
            Err(e) => return to_json(&CycleOutput::from(&e)),
        }
        self.detach();
        if let Ok(mut hooks) = self.hooks.try_borrow_mut() {
            hooks.top_padding = top_padding;
        }

        let viewport = Viewport::new(width, height, top_padding);
        let outcome = match with_engine(&self.engine, |e| e.mount(viewport, now_ms())) {
            Ok(outcome) => outcome,
            Err(e) => return to_json(&CycleOutput::from(&e)),
        };

        if let Err(e) = self.attach() {
            console_error(&format!("Error attaching bubble layout listeners: {e:?}"));
        }
        to_json(&outcome)
    }

    /// Report a viewport change explicitly (for hosts that size a container
    /// rather than the window).
    pub fn resize(&self, width: f64, height: f64, top_padding: f64) {
        let viewport = Viewport::new(width, height, top_padding);
        if let Err(e) = with_engine(&self.engine, |e| e.on_resize(viewport, now_ms())) {
            log::debug!("resize dropped: {e}");
        }
    }

    /// Domain event: `added`, `promoted` (or `bumped`), `moved`.
    pub fn notify(&self, event: &str) -> std::result::Result<(), JsError> {
        let event: DomainEvent = event.parse()?;
        with_engine(&self.engine, |e| e.on_event(event, now_ms()))?;
        Ok(())
    }

    /// Run whatever is due at `now` (ms, `performance.now()` clock). Returns the
    /// cycle JSON or `null`.
    pub fn tick(&self, now: f64) -> String {
        match poll_engine(&self.engine, &self.hooks, now) {
            Some(outcome) => to_json(&outcome),
            None => "null".to_string(),
        }
    }

    pub fn arrange_spiral(&self) -> String {
        self.run(|e| e.arrange_spiral())
    }

    pub fn arrange_grid(&self) -> String {
        self.run(|e| e.arrange_grid())
    }

    /// The host finished rendering. Returns the sync outcome JSON.
    pub fn view_rendered(&self) -> String {
        match with_engine(&self.engine, |e| e.on_view_rendered()) {
            Ok(outcome) => to_json(&outcome),
            Err(e) => to_json(&CycleOutput::from(&e)),
        }
    }

    /// Stop timers and listeners. The layout cannot be mounted again.
    pub fn unmount(&mut self) {
        self.detach();
        if let Err(e) = with_engine(&self.engine, |e| e.unmount()) {
            log::warn!("unmount while busy: {e}");
        }
    }
}

impl BubbleLayout {
    fn run(&self, f: impl FnOnce(&mut Engine) -> CycleOutcome) -> String {
        match with_engine(&self.engine, f) {
            Ok(outcome) => to_json(&outcome),
            Err(e) => to_json(&CycleOutput::from(&e)),
        }
    }

    fn attach(&mut self) -> std::result::Result<(), JsValue> {
        let Some(w) = window() else {
            return Ok(());
        };

        let on_resize = {
            let engine = Rc::clone(&self.engine);
            let hooks = Rc::clone(&self.hooks);
            Closure::<dyn FnMut()>::new(move || {
                let top_padding = hooks.try_borrow().map(|h| h.top_padding).unwrap_or(0.0);
                let Some(viewport) = window_viewport(top_padding) else {
                    return;
                };
                if let Err(e) = with_engine(&engine, |e| e.on_resize(viewport, now_ms())) {
                    log::debug!("resize dropped: {e}");
                }
            })
        };
        w.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
        self.resize_listener = Some(on_resize);

        let on_poll = {
            let engine = Rc::clone(&self.engine);
            let hooks = Rc::clone(&self.hooks);
            Closure::<dyn FnMut()>::new(move || {
                poll_engine(&engine, &hooks, now_ms());
            })
        };
        let interval = self
            .engine
            .try_borrow()
            .map(|e| e.config().timing.poll_interval_ms)
            .unwrap_or(100);
        let handle =
            w.set_interval_with_callback_and_timeout_and_arguments_0(on_poll.as_ref().unchecked_ref(), interval)?;
        self.poll_timer = Some((handle, on_poll));
        Ok(())
    }

    fn detach(&mut self) {
        let w = window();
        if let Some(listener) = self.resize_listener.take() {
            if let Some(w) = &w {
                let _ = w.remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref());
            }
        }
        if let Some((handle, _closure)) = self.poll_timer.take() {
            if let Some(w) = &w {
                w.clear_interval_with_handle(handle);
            }
        }
    }
}

impl Drop for BubbleLayout {
    fn drop(&mut self) {
        self.detach();
    }
}
