#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, Once};
use std::time::{Duration, Instant};

use storage_core::{
    ConsumerMode, FilterMode, Item, ItemType, ModFilter, RunPlan, SortMode, ViewOptions,
};
use storage_engine::{
    Collaborators, ConsumerModes, HandOffSink, RefreshContext, RefreshCoordinator, RefreshError,
    RefreshSettings, SortFilterEngine, SortOutput, StorageSource, WaitIndicator, WorkerEvent,
};
use tokio_util::sync::CancellationToken;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(storage_logging::initialize_for_tests);
}

/// Category of an item type in the fake sorter: hundreds digit.
pub fn category_of(item_type: ItemType) -> u16 {
    (item_type.0 / 100) as u16
}

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<Vec<Item>>,
    history: Mutex<Vec<Item>>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn with_items(items: Vec<Item>) -> Arc<Self> {
        let storage = Self::default();
        for item in items {
            storage.put(item);
        }
        Arc::new(storage)
    }

    /// Stores `item`, recording its type in the acquisition history on first sight.
    pub fn put(&self, item: Item) {
        let mut history = self.history.lock().unwrap();
        if !history.iter().any(|seen| seen.item_type == item.item_type) {
            history.push(item.clone());
        }
        self.items.lock().unwrap().push(item);
    }

    pub fn remove_type(&self, item_type: ItemType) {
        self.items
            .lock()
            .unwrap()
            .retain(|item| item.item_type != item_type);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl StorageSource for MemoryStorage {
    fn stored_items(&self) -> Result<Vec<Item>, RefreshError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RefreshError::Storage("storage unit offline".to_string()));
        }
        Ok(self.items.lock().unwrap().clone())
    }

    fn acquisition_history(&self) -> Result<Vec<Item>, RefreshError> {
        Ok(self.history.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SorterCall {
    pub filter: FilterMode,
    pub sort: SortMode,
    pub mod_filter: ModFilter,
    pub cap: Option<usize>,
    pub aggregate: bool,
    pub candidates: Vec<Item>,
}

/// Substring search, hundreds-digit categories, aggregation by type, name sort.
#[derive(Default)]
pub struct FakeSorter {
    calls: Mutex<Vec<SorterCall>>,
    gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl FakeSorter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next call signals `entered` and then blocks until `release` fires.
    pub fn block_next_call(&self) -> (mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }

    pub fn calls(&self) -> Vec<SorterCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl SortFilterEngine for FakeSorter {
    fn sort_and_filter(
        &self,
        context: &RefreshContext,
        cap: Option<usize>,
        aggregate: bool,
    ) -> Result<SortOutput, RefreshError> {
        self.calls.lock().unwrap().push(SorterCall {
            filter: context.filter(),
            sort: context.sort(),
            mod_filter: context.mod_filter(),
            cap,
            aggregate,
            candidates: context.candidates().to_vec(),
        });

        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv_timeout(Duration::from_secs(5));
        }

        let needle = context.search_text().trim().to_lowercase();
        let matching = context.candidates().iter().filter(|item| {
            (needle.is_empty() || item.name.to_lowercase().contains(&needle))
                && (context.filter() == FilterMode::ALL
                    || category_of(item.item_type) == context.filter().0)
                && match context.mod_filter() {
                    ModFilter::AllMods => true,
                    ModFilter::Only(wanted) => item.source_mod == Some(wanted),
                }
        });

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
        if context.sort() != SortMode::UNSPECIFIED {
            groups.sort_by(|a, b| a[0].name.cmp(&b[0].name));
        }
        if let Some(cap) = cap {
            groups.truncate(cap);
        }

        let items = groups
            .iter()
            .map(|group| {
                let mut shown = group[0].clone();
                shown.stack = group.iter().map(|item| item.stack).sum();
                shown
            })
            .collect();
        Ok(SortOutput {
            items,
            source_groups: groups,
        })
    }
}

#[derive(Clone, Default)]
pub struct FakeModes {
    pub mode: Rc<Cell<ConsumerMode>>,
    pub crafting_refreshes: Rc<Cell<u32>>,
}

impl ConsumerModes for FakeModes {
    fn mode(&self) -> ConsumerMode {
        self.mode.get()
    }

    fn refresh_crafting(&self) {
        self.crafting_refreshes.set(self.crafting_refreshes.get() + 1);
    }
}

#[derive(Clone, Default)]
pub struct RecordingWait {
    pub calls: Rc<RefCell<Vec<bool>>>,
}

impl WaitIndicator for RecordingWait {
    fn set_waiting(&self, waiting: bool) {
        self.calls.borrow_mut().push(waiting);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkerEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<WorkerEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl HandOffSink for RecordingSink {
    fn emit(&self, event: WorkerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn plan(options: ViewOptions) -> RunPlan {
    RunPlan {
        scope: None,
        options,
        item_deletion: false,
    }
}

pub fn context_for(plan: &RunPlan, candidates: Vec<Item>) -> (RefreshContext, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let mut context = RefreshContext::new(1, plan, CancellationToken::new(), sink.clone());
    context.set_candidates(candidates);
    (context, sink)
}

pub struct Harness {
    pub coordinator: RefreshCoordinator,
    pub storage: Arc<MemoryStorage>,
    pub sorter: Arc<FakeSorter>,
    pub modes: FakeModes,
    pub wait: RecordingWait,
    pub notifications: Rc<Cell<u32>>,
}

impl Harness {
    pub fn new(items: Vec<Item>) -> Self {
        Self::with_settings(items, RefreshSettings::default())
    }

    pub fn with_settings(items: Vec<Item>, settings: RefreshSettings) -> Self {
        init_logging();
        let storage = MemoryStorage::with_items(items);
        let sorter = FakeSorter::new();
        let modes = FakeModes::default();
        let wait = RecordingWait::default();
        let mut coordinator = RefreshCoordinator::new(
            settings,
            Collaborators {
                storage: storage.clone(),
                sorter: sorter.clone(),
                modes: Box::new(modes.clone()),
                wait: Box::new(wait.clone()),
            },
        );
        let notifications = Rc::new(Cell::new(0));
        let counter = notifications.clone();
        coordinator.subscribe(Box::new(move |published| {
            assert!(published.is_consistent());
            assert!(published.material_check_pending().iter().all(|pending| *pending));
            counter.set(counter.get() + 1);
        }));
        Self {
            coordinator,
            storage,
            sorter,
            modes,
            wait,
            notifications,
        }
    }

    /// Ticks until nothing is refreshing any more, or panics after two seconds.
    pub fn settle(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            self.coordinator.tick();
            if !self.coordinator.currently_refreshing() && !self.coordinator.view().refresh_pending
            {
                return;
            }
            assert!(Instant::now() < deadline, "refresh did not settle");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    pub fn published_names(&self) -> Vec<String> {
        self.coordinator
            .published()
            .items()
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }
}
