use crate::{ItemTypeSet, RunId, ViewOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show or hide the display's waiting indicator.
    SetWaiting(bool),
    /// Cancel the worker run that is still in flight.
    CancelRun { run_id: RunId },
    /// Build a context from `plan` and start a worker run for it.
    StartRun { run_id: RunId, plan: RunPlan },
    /// The crafting view refreshes itself.
    DelegateCraftingRefresh,
    /// Replace the published state with the finished run's output.
    Publish { run_id: RunId },
    /// Fire the "refresh completed" observers.
    NotifyRefreshed { run_id: RunId },
}

/// Parameters a worker run is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Item types to recompute; `None` recomputes everything.
    pub scope: Option<ItemTypeSet>,
    pub options: ViewOptions,
    pub item_deletion: bool,
}

impl RunPlan {
    pub fn is_incremental(&self) -> bool {
        self.scope.is_some()
    }
}
