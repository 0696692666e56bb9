use std::collections::HashMap;

use storage_core::{FilterMode, Item, ItemType, RunPlan};

use crate::{RefreshContext, RefreshError, StorageSource};

/// Where a run's candidate sequence starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateBase {
    /// The whole storage content.
    Storage,
    /// The items behind the previously published entries, captured on the
    /// consumer thread.
    Previous(Vec<Item>),
}

impl CandidateBase {
    /// Only incremental runs outside the recent filter reuse the published items.
    /// The recent filter ranks by global history and always starts from storage.
    pub fn needs_previous(plan: &RunPlan) -> bool {
        plan.is_incremental() && plan.options.filter != FilterMode::RECENT
    }
}

/// Builds the sequence the sorter will see. Runs on the worker thread.
pub fn assemble_candidates(
    context: &RefreshContext,
    base: CandidateBase,
    storage: &dyn StorageSource,
) -> Result<Vec<Item>, RefreshError> {
    let stored = storage.stored_items()?;

    let source = match (context.scope(), base) {
        (Some(scope), CandidateBase::Previous(previous)) => {
            let fresh = stored
                .into_iter()
                .filter(|item| scope.contains(&item.item_type));
            previous
                .into_iter()
                .filter(|item| !scope.contains(&item.item_type))
                .chain(fresh)
                .collect()
        }
        _ => stored,
    };

    if context.filter() == FilterMode::RECENT {
        let history = storage.acquisition_history()?;
        Ok(recent_order(source, &history))
    } else {
        Ok(source)
    }
}

/// Orders `source` by most recent first acquisition, one representative per
/// item type. Types missing from the history are dropped.
pub fn recent_order(source: Vec<Item>, history: &[Item]) -> Vec<Item> {
    let mut representatives: HashMap<ItemType, Item> = HashMap::new();
    for item in source {
        representatives.entry(item.item_type).or_insert(item);
    }

    history
        .iter()
        .rev()
        .filter_map(|entry| representatives.remove(&entry.item_type))
        .collect()
}
