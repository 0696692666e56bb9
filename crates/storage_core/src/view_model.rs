use serde::Serialize;

use crate::{RefreshPhase, ViewOptions};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RefreshViewModel {
    pub phase: RefreshPhase,
    pub currently_refreshing: bool,
    pub refresh_pending: bool,
    pub options: ViewOptions,
    pub completed_runs: u64,
    pub dirty: bool,
}
