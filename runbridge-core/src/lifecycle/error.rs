//! Error types for the run lifecycle

use thiserror::Error;

use super::platform::BoxError;
use crate::domain::run::{LifecycleState, RunHandle};

/// Why a monitored run did not complete successfully
#[derive(Debug, Error)]
pub enum PollError {
    /// Submitting the run failed
    #[error("failed to submit run: {source}")]
    SubmitFailed {
        #[source]
        source: BoxError,
    },

    /// Fetching the run's status failed; polling stops immediately
    #[error("failed to fetch status of run {handle}: {source}")]
    FetchFailed {
        handle: RunHandle,
        #[source]
        source: BoxError,
    },

    /// The run reached a terminal state other than TERMINATED
    #[error("run {handle} completed with error - life_cycle_state: {state}")]
    RunFailed {
        handle: RunHandle,
        state: LifecycleState,
    },

    /// The attempt budget ran out before the run reached a terminal state
    #[error("run {handle} did not complete after {attempts} attempt(s)")]
    Timeout { handle: RunHandle, attempts: u32 },

    /// Deleting the run failed
    #[error("failed to delete run {handle}: {source}")]
    DeleteFailed {
        handle: RunHandle,
        #[source]
        source: BoxError,
    },
}

impl PollError {
    /// The run this error refers to, if one was created
    pub fn handle(&self) -> Option<&RunHandle> {
        match self {
            PollError::SubmitFailed { .. } => None,
            PollError::FetchFailed { handle, .. }
            | PollError::RunFailed { handle, .. }
            | PollError::Timeout { handle, .. }
            | PollError::DeleteFailed { handle, .. } => Some(handle),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }
}

/// Rejected poll budget
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidPollPolicy {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("interval must be a non-negative number of seconds that fits a duration (got {0})")]
    Interval(f64),
}
