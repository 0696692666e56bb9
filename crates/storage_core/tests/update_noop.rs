use storage_core::{update, Msg, RefreshState};

#[test]
fn update_is_noop() {
    let state = RefreshState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
