use thiserror::Error;

use crate::planner::PlanError;
use crate::store::StoreError;

/// Errors that stop a whole run before any tile is fetched.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Output root unusable: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Run task failed: {0}")]
    TaskFailed(String),
}
