//! Submit, await completion, delete

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use runbridge_core::dto::run::{NewCluster, RunSpec, SparkSubmitTask};
use runbridge_core::lifecycle::{PollError, PollPolicy, RunLifecycleMonitor, RunPlatform};
use tracing::{info, warn};
use uuid::Uuid;

use super::UserScenario;
use crate::instrument::{RequestStats, timed};

/// Request name recorded for the await step
pub const AWAIT_REQUEST: &str = "poll_run_await_completion";

/// SparkPi on a single-worker cluster
///
/// For runs against a real workspace the jar path has to point at an
/// uploaded SparkPi assembly.
pub fn spark_pi_template() -> RunSpec {
    RunSpec {
        run_name: "LoadTestRun".to_string(),
        new_cluster: Some(NewCluster {
            spark_version: "5.3.x-scala2.11".to_string(),
            node_type_id: "Standard_D3_v2".to_string(),
            num_workers: 1,
            ..Default::default()
        }),
        spark_submit_task: Some(SparkSubmitTask {
            parameters: vec![
                "--class".to_string(),
                "org.apache.spark.examples.SparkPi".to_string(),
                "dbfs:/FileStore/tables/SparkPi_assembly_0_1-04ede.jar".to_string(),
                "1".to_string(),
            ],
        }),
        ..Default::default()
    }
}

/// Creates a run, waits for it to finish and deletes it
///
/// A failed create aborts the iteration, and so does a failed status fetch,
/// which skips the delete. A run that fails or times out is recorded and
/// still deleted.
pub struct SubmitDeleteScenario<P> {
    monitor: RunLifecycleMonitor<P>,
    policy: PollPolicy,
    stats: RequestStats,
    template: RunSpec,
}

impl<P: RunPlatform> SubmitDeleteScenario<P> {
    pub fn new(platform: P, policy: PollPolicy, stats: RequestStats, template: RunSpec) -> Self {
        Self {
            monitor: RunLifecycleMonitor::new(platform),
            policy,
            stats,
            template,
        }
    }

    /// Template with a fresh `run-<uuid>` name
    fn next_spec(&self) -> RunSpec {
        RunSpec {
            run_name: format!("run-{}", Uuid::new_v4()),
            ..self.template.clone()
        }
    }
}

#[async_trait]
impl<P: RunPlatform> UserScenario for SubmitDeleteScenario<P> {
    fn name(&self) -> &'static str {
        "submit-delete"
    }

    async fn run_once(&self, user: usize) -> Result<()> {
        let spec = self.next_spec();

        info!(user, "Run Creation: STARTED");
        let handle = self
            .monitor
            .platform()
            .submit_run(&spec)
            .await
            .map_err(|e| anyhow!(e).context(format!("Failed to create run {}", spec.run_name)))?;
        info!(user, run = %handle, "Run Creation: COMPLETE - {}", spec.run_name);

        info!(user, run = %handle, "Waiting for run to complete: STARTED");
        match timed(
            &self.stats,
            AWAIT_REQUEST,
            self.monitor.await_completion(&handle, &self.policy),
        )
        .await
        {
            Ok(status) => info!(
                user,
                run = %handle,
                result_state = status.result_state.as_deref().unwrap_or("-"),
                "Waiting for run to complete: COMPLETE"
            ),
            // the platform stopped answering for this run; leave it alone
            Err(e @ PollError::FetchFailed { .. }) => {
                return Err(anyhow::Error::new(e).context("Aborting iteration before delete"));
            }
            Err(e) => warn!(user, run = %handle, "Run did not complete: {}", e),
        }

        info!(user, run = %handle, "Run Deletion: STARTED");
        match self.monitor.delete(&handle).await {
            Ok(()) => info!(user, run = %handle, "Run Deletion: COMPLETE"),
            Err(e) => warn!(user, run = %handle, "{}", e),
        }

        Ok(())
    }
}
