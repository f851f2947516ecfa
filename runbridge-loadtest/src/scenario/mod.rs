//! Scenarios
//!
//! A scenario is the fixed sequence of steps one simulated user performs per
//! iteration. Each step's outcome is recorded through the instrumentation
//! layer; the scenario decides which failures end the iteration early.

mod noop;
mod submit_delete;

pub use noop::NoopScenario;
pub use submit_delete::{AWAIT_REQUEST, SubmitDeleteScenario, spark_pi_template};

use anyhow::Result;
use async_trait::async_trait;

/// Sequence of steps run by a simulated user
#[async_trait]
pub trait UserScenario: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Runs one iteration for `user`
    ///
    /// An error means the iteration was aborted part way through.
    async fn run_once(&self, user: usize) -> Result<()>;
}
