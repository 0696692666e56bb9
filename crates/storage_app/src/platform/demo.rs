use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Mutex;

use storage_core::{ConsumerMode, FilterMode, Item, ItemType, ModFilter, ModId, SortMode};
use storage_engine::{
    ConsumerModes, RefreshContext, RefreshError, SortFilterEngine, SortOutput, StorageSource,
    WaitIndicator,
};
use storage_logging::{refresh_debug, refresh_info};

pub const TOOLS: FilterMode = FilterMode(2);
pub const POTIONS: FilterMode = FilterMode(3);
pub const MATERIALS: FilterMode = FilterMode(4);

pub const SORT_BY_NAME: SortMode = SortMode(1);
pub const SORT_BY_STACK: SortMode = SortMode(2);

pub const ALCHEMY_MOD: ModId = ModId(1);

/// Hundreds digit of the item type, matching the filter ids above.
fn category_of(item_type: ItemType) -> u16 {
    (item_type.0 / 100) as u16
}

#[derive(Default)]
struct Inventory {
    items: Vec<Item>,
    history: Vec<Item>,
}

/// In-memory storage network shared between the consumer and worker threads.
#[derive(Default)]
pub struct DemoStorage {
    inventory: Mutex<Inventory>,
}

impl DemoStorage {
    pub fn seeded() -> Self {
        let storage = Self::default();
        for item in [
            Item::new(201, "Copper Pickaxe", 1),
            Item::new(202, "Torch", 99),
            Item::new(401, "Wood", 250),
            Item::new(402, "Stone Block", 120),
            Item::new(202, "Torch", 40),
            Item::new(301, "Lesser Healing Potion", 15).favorited(),
            Item::new(302, "Mana Potion", 8).from_mod(ALCHEMY_MOD),
        ] {
            storage.deposit(item);
        }
        storage
    }

    pub fn deposit(&self, item: Item) {
        let Ok(mut inventory) = self.inventory.lock() else {
            return;
        };
        if !inventory
            .history
            .iter()
            .any(|seen| seen.item_type == item.item_type)
        {
            inventory.history.push(item.clone());
        }
        inventory.items.push(item);
    }

    pub fn withdraw_all(&self, item_type: ItemType) {
        if let Ok(mut inventory) = self.inventory.lock() {
            inventory.items.retain(|item| item.item_type != item_type);
        }
    }
}

impl StorageSource for DemoStorage {
    fn stored_items(&self) -> Result<Vec<Item>, RefreshError> {
        self.inventory
            .lock()
            .map(|inventory| inventory.items.clone())
            .map_err(|_| RefreshError::Storage("inventory lock poisoned".to_string()))
    }

    fn acquisition_history(&self) -> Result<Vec<Item>, RefreshError> {
        self.inventory
            .lock()
            .map(|inventory| inventory.history.clone())
            .map_err(|_| RefreshError::Storage("inventory lock poisoned".to_string()))
    }
}

/// Reference sorter: substring search, category and mod filters, stacking by
/// type and a name or stack-size order.
#[derive(Debug, Default)]
pub struct NameSorter;

impl SortFilterEngine for NameSorter {
    fn sort_and_filter(
        &self,
        context: &RefreshContext,
        cap: Option<usize>,
        aggregate: bool,
    ) -> Result<SortOutput, RefreshError> {
        let needle = context.search_text().trim().to_lowercase();
        let matching: Vec<&Item> = context
            .candidates()
            .iter()
            .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
            .filter(|item| {
                context.filter() == FilterMode::ALL
                    || category_of(item.item_type) == context.filter().0
            })
            .filter(|item| match context.mod_filter() {
                ModFilter::AllMods => true,
                ModFilter::Only(wanted) => item.source_mod == Some(wanted),
            })
            .collect();
        context.complete_task();
        context.check_cancelled()?;

        let mut groups: Vec<Vec<Item>> = Vec::new();
        let mut slots: HashMap<ItemType, usize> = HashMap::new();
        for item in matching {
            match slots.get(&item.item_type) {
                Some(&slot) if aggregate => groups[slot].push(item.clone()),
                _ => {
                    slots.insert(item.item_type, groups.len());
                    groups.push(vec![item.clone()]);
                }
            }
        }
        context.complete_task();
        context.check_cancelled()?;

        for group in groups.iter_mut() {
            group.sort_by(|a, b| b.stack.cmp(&a.stack));
        }
        context.complete_task();

        match context.sort() {
            SortMode::UNSPECIFIED => {}
            SORT_BY_STACK => groups.sort_by(|a, b| total_stack(b).cmp(&total_stack(a))),
            _ => groups.sort_by(|a, b| a[0].name.cmp(&b[0].name)),
        }
        context.complete_task();

        if let Some(cap) = cap {
            groups.truncate(cap);
        }
        let items = groups
            .iter()
            .map(|group| {
                let mut shown = group[0].clone();
                shown.stack = total_stack(group);
                shown.favorited = group.iter().any(|item| item.favorited);
                shown
            })
            .collect();
        context.complete_task();

        Ok(SortOutput {
            items,
            source_groups: groups,
        })
    }
}

fn total_stack(group: &[Item]) -> u32 {
    group.iter().map(|item| item.stack).sum()
}

/// Mode switches made by the demo script, read by the coordinator each tick.
pub struct DemoModes {
    mode: Rc<Cell<ConsumerMode>>,
}

impl DemoModes {
    pub fn new(mode: Rc<Cell<ConsumerMode>>) -> Self {
        Self { mode }
    }
}

impl ConsumerModes for DemoModes {
    fn mode(&self) -> ConsumerMode {
        self.mode.get()
    }

    fn refresh_crafting(&self) {
        refresh_info!("Crafting view refreshed its recipes");
    }
}

pub struct LogWaitIndicator;

impl WaitIndicator for LogWaitIndicator {
    fn set_waiting(&self, waiting: bool) {
        refresh_debug!("wait indicator {}", if waiting { "shown" } else { "hidden" });
    }
}

#[cfg(test)]
mod tests {
    use super::{DemoStorage, NameSorter, SORT_BY_STACK, TOOLS};
    use std::sync::Arc;
    use storage_core::{ItemType, RunPlan, ViewOptions};
    use storage_engine::{
        HandOffSink, RefreshContext, SortFilterEngine, StorageSource, WorkerEvent,
    };
    use tokio_util::sync::CancellationToken;

    struct NullSink;

    impl HandOffSink for NullSink {
        fn emit(&self, _event: WorkerEvent) {}
    }

    fn context(options: ViewOptions, storage: &DemoStorage) -> RefreshContext {
        let plan = RunPlan {
            scope: None,
            options,
            item_deletion: false,
        };
        let mut context =
            RefreshContext::new(1, &plan, CancellationToken::new(), Arc::new(NullSink));
        context.set_candidates(storage.stored_items().unwrap());
        context
    }

    #[test]
    fn stacks_of_one_type_are_combined() {
        let storage = DemoStorage::seeded();
        let context = context(
            ViewOptions {
                filter: TOOLS,
                ..ViewOptions::default()
            },
            &storage,
        );

        let output = NameSorter.sort_and_filter(&context, None, true).unwrap();
        let names: Vec<_> = output.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Copper Pickaxe", "Torch"]);
        assert_eq!(output.items[1].stack, 139);
        assert_eq!(output.source_groups[1].len(), 2);
        assert_eq!(context.completed_tasks(), 5);
    }

    #[test]
    fn stack_order_puts_largest_first() {
        let storage = DemoStorage::seeded();
        let context = context(
            ViewOptions {
                sort: SORT_BY_STACK,
                ..ViewOptions::default()
            },
            &storage,
        );

        let output = NameSorter.sort_and_filter(&context, Some(2), true).unwrap();
        let names: Vec<_> = output.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Wood", "Torch"]);
    }

    #[test]
    fn history_records_first_deposit_only() {
        let storage = DemoStorage::seeded();
        storage.withdraw_all(ItemType(202));
        let history = storage.acquisition_history().unwrap();

        assert_eq!(history.len(), 6);
        assert!(storage
            .stored_items()
            .unwrap()
            .iter()
            .all(|item| item.item_type != ItemType(202)));
    }
}
