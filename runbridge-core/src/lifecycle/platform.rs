//! Collaborators the lifecycle monitor depends on
//!
//! The monitor never talks to the network or the clock directly. Callers pass
//! in a [`RunPlatform`] (usually the REST client) and a [`Sleeper`], which
//! keeps the decision logic testable against scripted substitutes.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::run::{RunHandle, RunStatus};
use crate::dto::run::RunSpec;

/// Error type returned by collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The platform operations a monitored run needs
///
/// Implementations must be safe to call concurrently from independent
/// monitors.
#[async_trait]
pub trait RunPlatform: Send + Sync {
    /// Creates a new run
    async fn submit_run(&self, spec: &RunSpec) -> Result<RunHandle, BoxError>;

    /// Fetches the current status of a run
    ///
    /// Returns `Ok(None)` when the platform has no status for the run yet.
    /// Transport and API failures are returned as errors.
    async fn fetch_run_status(&self, handle: &RunHandle) -> Result<Option<RunStatus>, BoxError>;

    /// Removes a run
    async fn delete_run(&self, handle: &RunHandle) -> Result<(), BoxError>;
}

#[async_trait]
impl<T: RunPlatform + ?Sized> RunPlatform for Arc<T> {
    async fn submit_run(&self, spec: &RunSpec) -> Result<RunHandle, BoxError> {
        (**self).submit_run(spec).await
    }

    async fn fetch_run_status(&self, handle: &RunHandle) -> Result<Option<RunStatus>, BoxError> {
        (**self).fetch_run_status(handle).await
    }

    async fn delete_run(&self, handle: &RunHandle) -> Result<(), BoxError> {
        (**self).delete_run(handle).await
    }
}

#[async_trait]
impl<T: RunPlatform + ?Sized> RunPlatform for &T {
    async fn submit_run(&self, spec: &RunSpec) -> Result<RunHandle, BoxError> {
        (**self).submit_run(spec).await
    }

    async fn fetch_run_status(&self, handle: &RunHandle) -> Result<Option<RunStatus>, BoxError> {
        (**self).fetch_run_status(handle).await
    }

    async fn delete_run(&self, handle: &RunHandle) -> Result<(), BoxError> {
        (**self).delete_run(handle).await
    }
}

/// Waits between polls
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
