use std::sync::Once;

use storage_core::{
    update, ConsumerMode, Effect, ItemType, ItemTypeSet, Msg, RefreshState, RunPlan, ViewOptions,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(storage_logging::initialize_for_tests);
}

fn types(ids: &[u32]) -> ItemTypeSet {
    ids.iter().copied().map(ItemType).collect()
}

fn storage_tick(state: RefreshState) -> (RefreshState, Vec<Effect>) {
    update(
        state,
        Msg::ProcessPending {
            mode: ConsumerMode::default(),
        },
    )
}

fn started_plan(effects: &[Effect]) -> &RunPlan {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartRun { plan, .. } => Some(plan),
            _ => None,
        })
        .expect("start run effect")
}

#[test]
fn repeated_plain_requests_coalesce() {
    init_logging();
    let (once, _) = update(RefreshState::new(), Msg::RefreshRequested { force_full: false });
    let (twice, _) = update(once.clone(), Msg::RefreshRequested { force_full: false });

    assert_eq!(once, twice);
    assert!(twice.flags().needs_refresh());
    assert!(!twice.flags().force_full_refresh());
}

#[test]
fn forced_request_after_plain_request_forces_full_run() {
    init_logging();
    let (state, _) = update(RefreshState::new(), Msg::ItemTypesChanged(types(&[3])));
    let (state, _) = update(state, Msg::RefreshRequested { force_full: false });
    let (state, _) = update(state, Msg::RefreshRequested { force_full: true });
    let (state, _) = update(state, Msg::RefreshRequested { force_full: false });
    assert!(state.flags().force_full_refresh());

    let (_state, effects) = storage_tick(state);
    assert!(!started_plan(&effects).is_incremental());
}

#[test]
fn nothing_pending_means_no_effects() {
    init_logging();
    let (state, effects) = storage_tick(RefreshState::new());

    assert!(effects.is_empty());
    assert!(!state.currently_refreshing());
}

#[test]
fn scopes_are_merged_into_one_incremental_run() {
    init_logging();
    let (state, _) = update(RefreshState::new(), Msg::ItemTypesChanged(types(&[1, 2])));
    let (state, _) = update(state, Msg::ItemTypesChanged(types(&[2, 5])));
    let (state, effects) = storage_tick(state);

    let plan = started_plan(&effects);
    assert_eq!(plan.scope, Some(types(&[1, 2, 5])));
    assert!(state.currently_refreshing());
    assert!(!state.flags().needs_refresh());
    assert!(state.flags().scope().is_none());
}

#[test]
fn empty_type_set_requests_nothing() {
    init_logging();
    let (state, _) = update(RefreshState::new(), Msg::ItemTypesChanged(ItemTypeSet::new()));
    assert!(!state.flags().needs_refresh());
}

#[test]
fn item_deletion_mode_forces_full_run() {
    init_logging();
    let (state, _) = update(RefreshState::new(), Msg::ItemTypesChanged(types(&[9])));
    let (_state, effects) = update(
        state,
        Msg::ProcessPending {
            mode: ConsumerMode::Storage {
                item_deletion: true,
            },
        },
    );

    let plan = started_plan(&effects);
    assert!(!plan.is_incremental());
    assert!(plan.item_deletion);
}

#[test]
fn disabled_mode_drops_pending_scope_without_running() {
    init_logging();
    let (state, _) = update(RefreshState::new(), Msg::ItemTypesChanged(types(&[4])));
    let (state, effects) = update(
        state,
        Msg::ProcessPending {
            mode: ConsumerMode::RefreshDisabled,
        },
    );

    assert!(effects.is_empty());
    assert!(!state.currently_refreshing());
    assert!(!state.flags().needs_refresh());
    assert!(state.flags().scope().is_none());
}

#[test]
fn crafting_mode_delegates_refresh() {
    init_logging();
    let (state, _) = update(RefreshState::new(), Msg::RefreshRequested { force_full: true });
    let (state, effects) = update(
        state,
        Msg::ProcessPending {
            mode: ConsumerMode::Crafting,
        },
    );

    assert_eq!(effects, vec![Effect::DelegateCraftingRefresh]);
    assert!(!state.currently_refreshing());
    assert!(!state.flags().force_full_refresh());
}

#[test]
fn changed_options_force_full_run_with_new_options() {
    init_logging();
    let options = ViewOptions {
        search_text: "torch".to_string(),
        ..ViewOptions::default()
    };
    let (state, _) = update(RefreshState::new(), Msg::ItemTypesChanged(types(&[1])));
    let (state, _) = update(state, Msg::OptionsChanged(options.clone()));
    let (_state, effects) = storage_tick(state);

    let plan = started_plan(&effects);
    assert!(!plan.is_incremental());
    assert_eq!(plan.options, options);
}

#[test]
fn unchanged_options_do_not_request_refresh() {
    init_logging();
    let (mut state, _) = update(
        RefreshState::new(),
        Msg::OptionsChanged(ViewOptions::default()),
    );
    assert!(!state.flags().needs_refresh());
    assert!(!state.consume_dirty());
}
