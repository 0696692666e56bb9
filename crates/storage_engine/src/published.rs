use serde::Serialize;
use storage_core::{Item, RunId};

use crate::{RunOutput, SearchAdvisory};

/// Results of the most recently published run, as read by the display.
///
/// Only the coordinator's hand-off step replaces it, on the consumer thread.
/// `items`, `source_items` and `material_check_pending` always have equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishedState {
    run_id: Option<RunId>,
    items: Vec<Item>,
    source_items: Vec<Vec<Item>>,
    /// `true` until the display evaluated material availability for the entry.
    material_check_pending: Vec<bool>,
    #[serde(skip)]
    material_available: Vec<bool>,
    advisory: Option<SearchAdvisory>,
}

impl PublishedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn source_items(&self) -> &[Vec<Item>] {
        &self.source_items
    }

    pub fn material_check_pending(&self) -> &[bool] {
        &self.material_check_pending
    }

    pub fn advisory(&self) -> Option<SearchAdvisory> {
        self.advisory
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_consistent(&self) -> bool {
        self.items.len() == self.source_items.len()
            && self.items.len() == self.material_check_pending.len()
            && self.items.len() == self.material_available.len()
    }

    /// Returns the cached material availability of entry `index`, running
    /// `probe` on the first request after a publication.
    pub fn evaluate_material(
        &mut self,
        index: usize,
        probe: impl FnOnce(&Item, &[Item]) -> bool,
    ) -> Option<bool> {
        let item = self.items.get(index)?;
        if self.material_check_pending[index] {
            self.material_available[index] = probe(item, &self.source_items[index]);
            self.material_check_pending[index] = false;
        }
        Some(self.material_available[index])
    }

    pub(crate) fn replace(&mut self, output: RunOutput) {
        let len = output.items.len();
        self.run_id = Some(output.run_id);
        self.items = output.items;
        self.source_items = output.source_groups;
        self.material_check_pending = vec![true; len];
        self.material_available = vec![false; len];
        self.advisory = output.advisory;
    }
}
