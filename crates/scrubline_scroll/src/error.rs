//! Orchestrator errors

use scrubline_core::error::ClockError;
use thiserror::Error;

/// Failures constructing an [`Orchestrator`](crate::Orchestrator)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("cannot start orchestrator: {0}")]
    ClockUnavailable(#[from] ClockError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
