use crate::{ConsumerMode, Effect, ItemTypeSet, Msg, RefreshPhase, RefreshState, RunPlan};

/// Pure update function: applies a message to state and returns any effects.
///
/// Effects must be executed in the returned order: a cancellation always
/// precedes the start of the run that supersedes it.
pub fn update(mut state: RefreshState, msg: Msg) -> (RefreshState, Vec<Effect>) {
    let effects = match msg {
        Msg::RefreshRequested { force_full } => {
            state.flags_mut().request(force_full);
            Vec::new()
        }
        Msg::ItemTypesChanged(types) => {
            if !types.is_empty() {
                state.flags_mut().request_types(types);
            }
            Vec::new()
        }
        Msg::OptionsChanged(options) => {
            if *state.options() != options {
                state.set_options(options);
                // Previously filtered items are no valid candidate base under new options.
                state.flags_mut().request(true);
            }
            Vec::new()
        }
        Msg::ProcessPending { mode } => process_pending(&mut state, mode),
        Msg::RunFinished { run_id } => match state.phase() {
            RefreshPhase::Running { run_id: active } if active == run_id => {
                state.begin_completing(run_id);
                vec![Effect::Publish { run_id }]
            }
            // Superseded run: its output must never reach the published state.
            _ => Vec::new(),
        },
        Msg::PublishApplied { run_id } => match state.phase() {
            RefreshPhase::Completing { run_id: active } if active == run_id => {
                state.finish_run();
                vec![Effect::NotifyRefreshed { run_id }, Effect::SetWaiting(false)]
            }
            _ => Vec::new(),
        },
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn process_pending(state: &mut RefreshState, mode: ConsumerMode) -> Vec<Effect> {
    if !state.flags().needs_refresh() {
        return Vec::new();
    }
    // Cleared before anything else so requests raised while the effects run
    // are kept as a new pending request.
    let pending = state.flags_mut().take();

    let item_deletion = match mode {
        ConsumerMode::RefreshDisabled => return Vec::new(),
        ConsumerMode::Crafting => return vec![Effect::DelegateCraftingRefresh],
        ConsumerMode::Storage { item_deletion } => item_deletion,
    };

    let mut scope = if pending.force_full_refresh() || item_deletion {
        None
    } else {
        pending.scope().cloned()
    };

    let mut effects = Vec::with_capacity(3);
    effects.push(Effect::SetWaiting(true));
    if let Some(previous) = state.active_run() {
        effects.push(Effect::CancelRun { run_id: previous });
        scope = cover_superseded(scope, state.running_scope());
    }
    let run_id = state.begin_run(scope.clone());
    effects.push(Effect::StartRun {
        run_id,
        plan: RunPlan {
            scope,
            options: state.options().clone(),
            item_deletion,
        },
    });
    effects
}

/// The cancelled run never publishes, so its replacement must recompute
/// everything the cancelled one would have: full stays full, scopes merge.
fn cover_superseded(
    scope: Option<ItemTypeSet>,
    cancelled: Option<&ItemTypeSet>,
) -> Option<ItemTypeSet> {
    match (scope, cancelled) {
        (Some(mut scope), Some(cancelled)) => {
            scope.extend(cancelled.iter().copied());
            Some(scope)
        }
        _ => None,
    }
}
