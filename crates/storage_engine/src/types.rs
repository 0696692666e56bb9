use std::fmt;

use serde::Serialize;
use storage_core::{Item, RunId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefreshError {
    /// The run was superseded. Not a failure; nothing is published.
    #[error("refresh run cancelled")]
    Cancelled,
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("sort/filter failed: {0}")]
    Sorter(String),
    #[error("could not start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker thread panicked")]
    WorkerPanicked,
}

impl RefreshError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RefreshError::Cancelled)
    }
}

/// What the sorter hands back: display items and, index for index, the
/// stored items each one aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortOutput {
    pub items: Vec<Item>,
    pub source_groups: Vec<Vec<Item>>,
}

/// A constraint that was dropped because the search matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchAdvisory {
    DefaultedToAllItems,
    DefaultedToAllMods,
}

impl fmt::Display for SearchAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchAdvisory::DefaultedToAllItems => {
                write!(f, "No items matched in this category, showing all items")
            }
            SearchAdvisory::DefaultedToAllMods => {
                write!(f, "No items matched in the selected mod, showing all mods")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgress {
    pub run_id: RunId,
    pub label: String,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub run_id: RunId,
    pub items: Vec<Item>,
    pub source_groups: Vec<Vec<Item>>,
    pub advisory: Option<SearchAdvisory>,
}

/// Messages a worker run queues for the consumer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Progress(RunProgress),
    Completed(Box<RunOutput>),
}
