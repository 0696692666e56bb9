use storage_core::{ConsumerMode, Item};

use crate::{RefreshContext, RefreshError, SortOutput};

/// The storage network that holds the raw items. Read from worker threads.
pub trait StorageSource: Send + Sync {
    fn stored_items(&self) -> Result<Vec<Item>, RefreshError>;

    /// Every item type ever put into storage, one entry per type, oldest first.
    fn acquisition_history(&self) -> Result<Vec<Item>, RefreshError>;
}

/// Filters, aggregates and sorts `context.candidates()`.
///
/// Implementations may report progress through [`RefreshContext::complete_task`]
/// and should poll [`RefreshContext::check_cancelled`] during long passes.
pub trait SortFilterEngine: Send + Sync {
    fn sort_and_filter(
        &self,
        context: &RefreshContext,
        cap: Option<usize>,
        aggregate: bool,
    ) -> Result<SortOutput, RefreshError>;
}

/// Consumer-thread view of what the display is currently showing.
pub trait ConsumerModes {
    fn mode(&self) -> ConsumerMode;

    /// Runs the crafting view's own refresh.
    fn refresh_crafting(&self);
}

pub trait WaitIndicator {
    fn set_waiting(&self, waiting: bool);
}
