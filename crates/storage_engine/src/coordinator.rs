use std::sync::{mpsc, Arc};

use storage_core::{
    update, Effect, ItemTypeSet, Msg, RefreshState, RefreshViewModel, RunId, RunPlan,
    ViewOptions,
};
use storage_logging::{refresh_debug, refresh_error, refresh_info};
use tokio_util::sync::CancellationToken;

use crate::candidates::CandidateBase;
use crate::{
    ChannelHandOffSink, ConsumerModes, HandOffSink, PublishedState, RefreshContext,
    RefreshError, RefreshSettings, RunOutput, RunProgress, SearchAdvisory, SortFilterEngine,
    StorageSource, WaitIndicator, WorkerEvent, WorkerRun,
};

/// Called on the consumer thread once per published run.
pub type RefreshObserver = Box<dyn FnMut(&PublishedState)>;

pub struct Collaborators {
    pub storage: Arc<dyn StorageSource>,
    pub sorter: Arc<dyn SortFilterEngine>,
    pub modes: Box<dyn ConsumerModes>,
    pub wait: Box<dyn WaitIndicator>,
}

/// Consumer-thread owner of the refresh lifecycle.
///
/// Feeds requests and worker hand-offs into the pure core state machine and
/// executes the effects it returns. It is the only writer of the
/// [`PublishedState`]; workers never touch it.
pub struct RefreshCoordinator {
    state: RefreshState,
    settings: RefreshSettings,
    collaborators: Collaborators,
    sink: Arc<dyn HandOffSink>,
    events: mpsc::Receiver<WorkerEvent>,
    active: Option<WorkerRun>,
    finished: Option<RunOutput>,
    published: PublishedState,
    progress: Option<RunProgress>,
    observers: Vec<RefreshObserver>,
}

impl RefreshCoordinator {
    pub fn new(settings: RefreshSettings, collaborators: Collaborators) -> Self {
        let (tx, events) = mpsc::channel();
        Self {
            state: RefreshState::new(),
            settings,
            collaborators,
            sink: Arc::new(ChannelHandOffSink::new(tx)),
            events,
            active: None,
            finished: None,
            published: PublishedState::new(),
            progress: None,
            observers: Vec::new(),
        }
    }

    /// Marks that a refresh is needed. Repeated calls coalesce.
    pub fn request_refresh(&mut self, force_full: bool) {
        self.dispatch(Msg::RefreshRequested { force_full });
    }

    /// Requests an incremental refresh of the given item types.
    pub fn request_item_types(&mut self, types: ItemTypeSet) {
        self.dispatch(Msg::ItemTypesChanged(types));
    }

    pub fn set_options(&mut self, options: ViewOptions) {
        self.dispatch(Msg::OptionsChanged(options));
    }

    /// Starts a run if one is pending. Call once per consumer tick.
    pub fn process_pending_refresh(&mut self) {
        let mode = self.collaborators.modes.mode();
        self.dispatch(Msg::ProcessPending { mode });
    }

    /// Applies every worker event queued since the last call, in order.
    pub fn drain_hand_offs(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                WorkerEvent::Progress(progress) => {
                    if self.state.active_run() == Some(progress.run_id) {
                        self.progress = Some(progress);
                    }
                }
                WorkerEvent::Completed(output) => {
                    let run_id = output.run_id;
                    self.finished = Some(*output);
                    self.dispatch(Msg::RunFinished { run_id });
                    // Left over only when the run was superseded.
                    if self.finished.take().is_some() {
                        refresh_debug!("Discarded stale hand-off of run {run_id}");
                    }
                }
            }
        }
    }

    /// One consumer tick: publish finished runs, then start pending ones.
    pub fn tick(&mut self) {
        self.drain_hand_offs();
        self.process_pending_refresh();
    }

    pub fn subscribe(&mut self, observer: RefreshObserver) {
        self.observers.push(observer);
    }

    pub fn currently_refreshing(&self) -> bool {
        self.state.currently_refreshing()
    }

    pub fn published(&self) -> &PublishedState {
        &self.published
    }

    pub fn advisory(&self) -> Option<SearchAdvisory> {
        self.published.advisory()
    }

    pub fn progress(&self) -> Option<&RunProgress> {
        self.progress.as_ref()
    }

    pub fn options(&self) -> &ViewOptions {
        self.state.options()
    }

    pub fn view(&self) -> RefreshViewModel {
        self.state.view()
    }

    /// See [`PublishedState::evaluate_material`].
    pub fn evaluate_material(
        &mut self,
        index: usize,
        probe: impl FnOnce(&storage_core::Item, &[storage_core::Item]) -> bool,
    ) -> Option<bool> {
        self.published.evaluate_material(index, probe)
    }

    /// Cancels the active run, waits for its thread to exit and drops
    /// anything it queued. Nothing is published afterwards.
    pub fn shutdown(&mut self) -> Result<(), RefreshError> {
        let result = match self.active.take() {
            Some(run) => {
                run.cancel();
                match run.join() {
                    Err(RefreshError::Cancelled) => Ok(()),
                    other => other,
                }
            }
            None => Ok(()),
        };
        while self.events.try_recv().is_ok() {}
        self.progress = None;
        result
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SetWaiting(waiting) => self.collaborators.wait.set_waiting(waiting),
            Effect::CancelRun { run_id } => {
                if let Some(run) = self.active.take() {
                    refresh_debug!("Cancelling run {run_id} (superseded)");
                    // Detached: joining here would block the consumer thread.
                    run.cancel();
                }
                self.progress = None;
            }
            Effect::StartRun { run_id, plan } => self.start_run(run_id, plan),
            Effect::DelegateCraftingRefresh => self.collaborators.modes.refresh_crafting(),
            Effect::Publish { run_id } => self.publish(run_id),
            Effect::NotifyRefreshed { run_id } => {
                refresh_info!("Run {} published {} items", run_id, self.published.len());
                let published = &self.published;
                for observer in self.observers.iter_mut() {
                    observer(published);
                }
            }
        }
    }

    fn start_run(&mut self, run_id: RunId, plan: RunPlan) {
        let base = if CandidateBase::needs_previous(&plan) {
            // The underlying stacks, not the aggregated display entries.
            CandidateBase::Previous(self.published.source_items().concat())
        } else {
            CandidateBase::Storage
        };
        refresh_debug!(
            "Starting run {} ({})",
            run_id,
            if plan.is_incremental() { "incremental" } else { "full" }
        );

        let context =
            RefreshContext::new(run_id, &plan, CancellationToken::new(), self.sink.clone());
        match WorkerRun::start(
            context,
            base,
            self.collaborators.storage.clone(),
            self.collaborators.sorter.clone(),
            self.settings.clone(),
        ) {
            Ok(run) => self.active = Some(run),
            // Stays "refreshing" with nothing published.
            Err(err) => refresh_error!("Could not start refresh run {run_id}: {err}"),
        }
    }

    fn publish(&mut self, run_id: RunId) {
        let Some(output) = self.finished.take() else {
            return;
        };
        if output.run_id != run_id {
            return;
        }
        self.published.replace(output);
        if self.active.as_ref().map(WorkerRun::run_id) == Some(run_id) {
            self.active = None;
        }
        self.progress = None;
        self.dispatch(Msg::PublishApplied { run_id });
    }
}

impl Drop for RefreshCoordinator {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            run.cancel();
        }
    }
}
