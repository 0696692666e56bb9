use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use storage_core::{FilterMode, Item, ItemTypeSet, ModFilter, RunId, RunPlan, SortMode};
use tokio_util::sync::CancellationToken;

use crate::{HandOffSink, RefreshError, RunProgress, WorkerEvent};

#[derive(Debug)]
struct TaskSchedule {
    label: String,
    total: usize,
    completed: AtomicUsize,
}

/// Parameters and private scratch buffers of one refresh run.
///
/// Owned by the worker thread for the lifetime of the run. The consumer only
/// holds a clone of the cancellation token.
pub struct RefreshContext {
    run_id: RunId,
    filter: FilterMode,
    sort: SortMode,
    search_text: String,
    mod_filter: ModFilter,
    only_favorites: bool,
    item_deletion: bool,
    scope: Option<ItemTypeSet>,
    token: CancellationToken,
    tasks: TaskSchedule,
    sink: Arc<dyn HandOffSink>,
    candidates: Vec<Item>,
    result_items: Vec<Item>,
    result_groups: Vec<Vec<Item>>,
}

impl RefreshContext {
    pub fn new(
        run_id: RunId,
        plan: &RunPlan,
        token: CancellationToken,
        sink: Arc<dyn HandOffSink>,
    ) -> Self {
        let options = &plan.options;
        Self {
            run_id,
            filter: options.filter,
            sort: options.sort,
            search_text: options.search_text.clone(),
            mod_filter: options.mod_filter,
            only_favorites: options.only_favorites,
            item_deletion: plan.item_deletion,
            scope: plan.scope.clone(),
            token,
            tasks: TaskSchedule {
                label: String::new(),
                total: 0,
                completed: AtomicUsize::new(0),
            },
            sink,
            candidates: Vec::new(),
            result_items: Vec::new(),
            result_groups: Vec::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn mod_filter(&self) -> ModFilter {
        self.mod_filter
    }

    pub fn only_favorites(&self) -> bool {
        self.only_favorites
    }

    pub fn item_deletion(&self) -> bool {
        self.item_deletion
    }

    /// Item types an incremental run recomputes; `None` for full runs.
    pub fn scope(&self) -> Option<&ItemTypeSet> {
        self.scope.as_ref()
    }

    pub fn is_incremental(&self) -> bool {
        self.scope.is_some()
    }

    pub fn candidates(&self) -> &[Item] {
        &self.candidates
    }

    pub fn result_items(&self) -> &[Item] {
        &self.result_items
    }

    pub fn result_groups(&self) -> &[Vec<Item>] {
        &self.result_groups
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn check_cancelled(&self) -> Result<(), RefreshError> {
        if self.token.is_cancelled() {
            Err(RefreshError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Marks one sub-step done and reports it to the consumer.
    pub fn complete_task(&self) {
        let completed = self.tasks.completed.fetch_add(1, Ordering::Relaxed) + 1;
        self.sink.emit(WorkerEvent::Progress(RunProgress {
            run_id: self.run_id,
            label: self.tasks.label.clone(),
            completed: completed.min(self.tasks.total),
            total: self.tasks.total,
        }));
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks.completed.load(Ordering::Relaxed)
    }

    pub(crate) fn init_task_schedule(&mut self, total: usize, label: &str) {
        self.tasks = TaskSchedule {
            label: label.to_string(),
            total,
            completed: AtomicUsize::new(0),
        };
    }

    pub(crate) fn reset_task_completion(&self) {
        self.tasks.completed.store(0, Ordering::Relaxed);
    }

    pub(crate) fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub(crate) fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    pub(crate) fn set_mod_filter(&mut self, mod_filter: ModFilter) {
        self.mod_filter = mod_filter;
    }

    pub fn set_candidates(&mut self, candidates: Vec<Item>) {
        self.candidates = candidates;
    }

    pub(crate) fn push_result(&mut self, item: Item, group: Vec<Item>) {
        self.result_items.push(item);
        self.result_groups.push(group);
    }

    pub(crate) fn clear_results(&mut self) {
        self.result_items.clear();
        self.result_groups.clear();
    }

    pub(crate) fn take_results(&mut self) -> (Vec<Item>, Vec<Vec<Item>>) {
        (
            std::mem::take(&mut self.result_items),
            std::mem::take(&mut self.result_groups),
        )
    }

    pub(crate) fn emit(&self, event: WorkerEvent) {
        self.sink.emit(event);
    }
}
