use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use storage_core::RunId;
use storage_logging::{refresh_debug, refresh_error};
use tokio_util::sync::CancellationToken;

use crate::candidates::{assemble_candidates, CandidateBase};
use crate::pipeline::run_pipeline;
use crate::{
    RefreshContext, RefreshError, RefreshSettings, RunOutput, SearchAdvisory, SortFilterEngine,
    StorageSource, WorkerEvent,
};

/// Queues worker events for execution on the consumer thread, in order.
pub trait HandOffSink: Send + Sync {
    fn emit(&self, event: WorkerEvent);
}

pub struct ChannelHandOffSink {
    tx: mpsc::Sender<WorkerEvent>,
}

impl ChannelHandOffSink {
    pub fn new(tx: mpsc::Sender<WorkerEvent>) -> Self {
        Self { tx }
    }
}

impl HandOffSink for ChannelHandOffSink {
    fn emit(&self, event: WorkerEvent) {
        // The consumer may already be gone during shutdown.
        let _ = self.tx.send(event);
    }
}

/// One background refresh run bound to one [`RefreshContext`].
pub struct WorkerRun {
    run_id: RunId,
    token: CancellationToken,
    handle: JoinHandle<Result<(), RefreshError>>,
}

impl WorkerRun {
    pub fn start(
        context: RefreshContext,
        base: CandidateBase,
        storage: Arc<dyn StorageSource>,
        sorter: Arc<dyn SortFilterEngine>,
        settings: RefreshSettings,
    ) -> Result<Self, RefreshError> {
        let run_id = context.run_id();
        let token = context.token().clone();

        let handle = thread::Builder::new()
            .name(format!("storage-refresh-{run_id}"))
            .spawn(move || {
                let mut context = context;
                let result = execute(
                    &mut context,
                    base,
                    storage.as_ref(),
                    sorter.as_ref(),
                    &settings,
                );
                finish(context, result)
            })?;

        Ok(Self {
            run_id,
            token,
            handle,
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Requests cooperative cancellation. The worker notices at its next step boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the worker thread exits. Never call this from a consumer tick.
    pub fn join(self) -> Result<(), RefreshError> {
        self.handle
            .join()
            .unwrap_or(Err(RefreshError::WorkerPanicked))
    }
}

fn execute(
    context: &mut RefreshContext,
    base: CandidateBase,
    storage: &dyn StorageSource,
    sorter: &dyn SortFilterEngine,
    settings: &RefreshSettings,
) -> Result<Option<SearchAdvisory>, RefreshError> {
    context.check_cancelled()?;
    let candidates = assemble_candidates(context, base, storage)?;
    refresh_debug!(
        "Run {} assembled {} candidates (incremental: {})",
        context.run_id(),
        candidates.len(),
        context.is_incremental()
    );
    context.set_candidates(candidates);
    run_pipeline(context, sorter, settings)
}

fn finish(
    mut context: RefreshContext,
    result: Result<Option<SearchAdvisory>, RefreshError>,
) -> Result<(), RefreshError> {
    let run_id = context.run_id();
    match result {
        // A cancel that lands after the last step check still discards the run.
        Ok(_) if context.is_cancelled() => {
            refresh_debug!("Run {run_id} cancelled after filtering; discarding");
            Err(RefreshError::Cancelled)
        }
        Ok(advisory) => {
            let (items, source_groups) = context.take_results();
            context.emit(WorkerEvent::Completed(Box::new(RunOutput {
                run_id,
                items,
                source_groups,
                advisory,
            })));
            Ok(())
        }
        Err(RefreshError::Cancelled) => {
            refresh_debug!("Run {run_id} cancelled; discarding");
            Err(RefreshError::Cancelled)
        }
        Err(err) => {
            refresh_error!("Run {run_id} failed: {err}");
            Err(err)
        }
    }
}
