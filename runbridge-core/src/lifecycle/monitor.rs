//! Run lifecycle monitor
//!
//! Polls a run until it reaches a terminal state or the poll budget runs out.
//! Polling for one run is strictly sequential: fetch, decide, sleep, repeat.
//! Independent runs are watched by independent calls; the monitor keeps no
//! state between them.

use crate::domain::run::{LifecycleState, RunHandle, RunStatus};
use crate::dto::run::RunSpec;

use super::error::PollError;
use super::platform::{RunPlatform, Sleeper, TokioSleeper};
use super::policy::PollPolicy;

/// A run that reached TERMINATED
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub handle: RunHandle,
    pub status: RunStatus,
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Completed,
    Failed(LifecycleState),
    Pending,
}

/// Interprets one status snapshot
///
/// Only TERMINATED, SKIPPED and INTERNAL_ERROR end polling. Any other label,
/// or no lifecycle state at all, means the run is still in progress.
fn decide(status: &RunStatus) -> Decision {
    match status.life_cycle_state.as_ref() {
        Some(LifecycleState::Terminated) => Decision::Completed,
        Some(state @ (LifecycleState::Skipped | LifecycleState::InternalError)) => {
            Decision::Failed(state.clone())
        }
        _ => Decision::Pending,
    }
}

/// Drives runs on a [`RunPlatform`] through to a terminal state
pub struct RunLifecycleMonitor<P, S = TokioSleeper> {
    platform: P,
    sleeper: S,
}

impl<P: RunPlatform> RunLifecycleMonitor<P> {
    /// Creates a monitor that sleeps on the tokio timer
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            sleeper: TokioSleeper,
        }
    }
}

impl<P: RunPlatform, S: Sleeper> RunLifecycleMonitor<P, S> {
    /// Creates a monitor with a custom sleeper
    pub fn with_sleeper(platform: P, sleeper: S) -> Self {
        Self { platform, sleeper }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Polls `handle` until it reaches a terminal state
    ///
    /// Performs at most `policy.max_attempts()` fetches and sleeps for
    /// `policy.interval()` after every fetch that did not end polling,
    /// including the last one before giving up. A failed fetch aborts
    /// immediately and is never retried.
    pub async fn await_completion(
        &self,
        handle: &RunHandle,
        policy: &PollPolicy,
    ) -> Result<RunStatus, PollError> {
        for _ in 0..policy.max_attempts() {
            let status = self
                .platform
                .fetch_run_status(handle)
                .await
                .map_err(|source| PollError::FetchFailed {
                    handle: handle.clone(),
                    source,
                })?;

            // no status yet counts as in progress
            if let Some(status) = status {
                match decide(&status) {
                    Decision::Completed => return Ok(status),
                    Decision::Failed(state) => {
                        return Err(PollError::RunFailed {
                            handle: handle.clone(),
                            state,
                        });
                    }
                    Decision::Pending => {}
                }
            }

            self.sleeper.sleep(policy.interval()).await;
        }

        Err(PollError::Timeout {
            handle: handle.clone(),
            attempts: policy.max_attempts(),
        })
    }

    /// Submits a run and waits for it to complete
    ///
    /// The run is left in place; deleting it is up to the caller, using the
    /// returned handle or [`PollError::handle`].
    pub async fn submit_and_await(
        &self,
        spec: &RunSpec,
        policy: &PollPolicy,
    ) -> Result<CompletedRun, PollError> {
        let handle = self
            .platform
            .submit_run(spec)
            .await
            .map_err(|source| PollError::SubmitFailed { source })?;

        let status = self.await_completion(&handle, policy).await?;

        Ok(CompletedRun { handle, status })
    }

    /// Deletes a run through the platform
    pub async fn delete(&self, handle: &RunHandle) -> Result<(), PollError> {
        self.platform
            .delete_run(handle)
            .await
            .map_err(|source| PollError::DeleteFailed {
                handle: handle.clone(),
                source,
            })
    }
}
