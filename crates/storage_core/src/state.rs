use serde::Serialize;

use crate::view_model::RefreshViewModel;
use crate::{ItemType, ItemTypeSet, ViewOptions};

pub type RunId = u64;

/// Coalesced refresh requests, owned by the consumer thread.
///
/// Setting a flag is idempotent (boolean OR, set union for the scope). All
/// flags are cleared together when a tick starts processing them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshFlags {
    needs_refresh: bool,
    force_full_refresh: bool,
    scope: Option<ItemTypeSet>,
}

impl RefreshFlags {
    pub fn request(&mut self, force_full: bool) {
        self.needs_refresh = true;
        self.force_full_refresh |= force_full;
    }

    /// Requests an incremental refresh restricted to `types`, merged with any
    /// scope already pending.
    pub fn request_types(&mut self, types: impl IntoIterator<Item = ItemType>) {
        self.needs_refresh = true;
        self.scope.get_or_insert_with(ItemTypeSet::new).extend(types);
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn force_full_refresh(&self) -> bool {
        self.force_full_refresh
    }

    pub fn scope(&self) -> Option<&ItemTypeSet> {
        self.scope.as_ref()
    }

    pub(crate) fn take(&mut self) -> RefreshFlags {
        std::mem::take(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RefreshPhase {
    #[default]
    Idle,
    /// A worker run is in flight.
    Running { run_id: RunId },
    /// The run's hand-off reached the consumer and is being published.
    Completing { run_id: RunId },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshState {
    flags: RefreshFlags,
    phase: RefreshPhase,
    /// Scope of the run in flight. `None` while running means a full run.
    running_scope: Option<ItemTypeSet>,
    options: ViewOptions,
    last_run_id: RunId,
    completed_runs: u64,
    dirty: bool,
}

impl RefreshState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ViewOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn view(&self) -> RefreshViewModel {
        RefreshViewModel {
            phase: self.phase,
            currently_refreshing: self.currently_refreshing(),
            refresh_pending: self.flags.needs_refresh(),
            options: self.options.clone(),
            completed_runs: self.completed_runs,
            dirty: self.dirty,
        }
    }

    pub fn flags(&self) -> &RefreshFlags {
        &self.flags
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn currently_refreshing(&self) -> bool {
        self.phase != RefreshPhase::Idle
    }

    /// The run that may still be cancelled, if any.
    pub fn active_run(&self) -> Option<RunId> {
        match self.phase {
            RefreshPhase::Running { run_id } => Some(run_id),
            RefreshPhase::Idle | RefreshPhase::Completing { .. } => None,
        }
    }

    /// Types the active run recomputes, or `None` for a full run or no run.
    pub fn running_scope(&self) -> Option<&ItemTypeSet> {
        self.active_run().and(self.running_scope.as_ref())
    }

    pub fn completed_runs(&self) -> u64 {
        self.completed_runs
    }

    /// Returns whether the view changed since the last call and resets the marker.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn flags_mut(&mut self) -> &mut RefreshFlags {
        &mut self.flags
    }

    pub(crate) fn set_options(&mut self, options: ViewOptions) {
        self.options = options;
        self.dirty = true;
    }

    pub(crate) fn begin_run(&mut self, scope: Option<ItemTypeSet>) -> RunId {
        self.last_run_id += 1;
        self.running_scope = scope;
        self.phase = RefreshPhase::Running {
            run_id: self.last_run_id,
        };
        self.dirty = true;
        self.last_run_id
    }

    pub(crate) fn begin_completing(&mut self, run_id: RunId) {
        self.phase = RefreshPhase::Completing { run_id };
        self.dirty = true;
    }

    pub(crate) fn finish_run(&mut self) {
        self.phase = RefreshPhase::Idle;
        self.running_scope = None;
        self.completed_runs += 1;
        self.dirty = true;
    }
}
