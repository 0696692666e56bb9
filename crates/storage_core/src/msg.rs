#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Someone asked for the item view to be recomputed.
    RefreshRequested { force_full: bool },
    /// Stored items of these types were added, removed or changed.
    ItemTypesChanged(crate::ItemTypeSet),
    /// The display changed its filter, sort, search or mod selection.
    OptionsChanged(crate::ViewOptions),
    /// Consumer tick: start a run if one is pending.
    ProcessPending { mode: crate::ConsumerMode },
    /// A worker run delivered its hand-off to the consumer thread.
    RunFinished { run_id: crate::RunId },
    /// The hand-off of `run_id` has been written to the published state.
    PublishApplied { run_id: crate::RunId },
    /// Fallback for placeholder wiring.
    NoOp,
}
