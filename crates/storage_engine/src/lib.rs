//! Storage refresh engine: background filtering runs and their hand-off to the consumer.
mod candidates;
mod context;
mod coordinator;
mod pipeline;
mod published;
mod settings;
mod source;
mod types;
mod worker;

pub use candidates::{assemble_candidates, recent_order, CandidateBase};
pub use context::RefreshContext;
pub use coordinator::{Collaborators, RefreshCoordinator, RefreshObserver};
pub use pipeline::run_pipeline;
pub use published::PublishedState;
pub use settings::RefreshSettings;
pub use source::{ConsumerModes, SortFilterEngine, StorageSource, WaitIndicator};
pub use types::{RefreshError, RunOutput, RunProgress, SearchAdvisory, SortOutput, WorkerEvent};
pub use worker::{ChannelHandOffSink, HandOffSink, WorkerRun};
