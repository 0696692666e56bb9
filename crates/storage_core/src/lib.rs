//! Storage refresh core: pure refresh state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::{Effect, RunPlan};
pub use msg::Msg;
pub use state::{RefreshFlags, RefreshPhase, RefreshState, RunId};
pub use types::{
    ConsumerMode, FilterMode, Item, ItemType, ItemTypeSet, ModFilter, ModId, SortMode,
    ViewOptions,
};
pub use update::update;
pub use view_model::RefreshViewModel;
