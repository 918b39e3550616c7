//! In-memory view for tests.

use std::collections::HashMap;

use crate::model::ItemId;
use crate::sync::RenderedView;

/// Rendered elements keyed by item id. Unmounted items have no entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
    elements: HashMap<ItemId, String>,
    pub writes: usize,
}

impl MemoryView {
    pub fn mounted(ids: &[&str]) -> Self {
        let mut view = Self::default();
        for id in ids {
            view.mount(id);
        }
        view
    }

    pub fn mount(&mut self, id: &str) {
        self.elements.entry(ItemId::from(id)).or_default();
    }

    pub fn set(&mut self, id: &str, transform: &str) {
        self.elements.insert(ItemId::from(id), transform.to_string());
    }

    pub fn transform(&self, id: &str) -> Option<&str> {
        self.elements.get(&ItemId::from(id)).map(String::as_str)
    }
}

impl RenderedView for MemoryView {
    fn read_transform(&self, id: &ItemId) -> Option<String> {
        self.elements.get(id).cloned()
    }

    fn write_transform(&mut self, id: &ItemId, transform: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(slot) => {
                *slot = transform.to_string();
                self.writes += 1;
                true
            }
            None => false,
        }
    }
}
