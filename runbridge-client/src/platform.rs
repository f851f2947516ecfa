//! [`RunPlatform`] implementation backed by the REST API

use async_trait::async_trait;
use runbridge_core::domain::run::{RunHandle, RunStatus};
use runbridge_core::dto::run::RunSpec;
use runbridge_core::lifecycle::{BoxError, RunPlatform};

use crate::PlatformClient;

#[async_trait]
impl RunPlatform for PlatformClient {
    async fn submit_run(&self, spec: &RunSpec) -> Result<RunHandle, BoxError> {
        Ok(PlatformClient::submit_run(self, spec).await?)
    }

    async fn fetch_run_status(&self, handle: &RunHandle) -> Result<Option<RunStatus>, BoxError> {
        let run = self.find_run(handle).await?;
        Ok(run.as_ref().map(RunStatus::from))
    }

    /// Cancels before deleting so a still-running run is not left behind
    async fn delete_run(&self, handle: &RunHandle) -> Result<(), BoxError> {
        Ok(self.cancel_and_delete_run(handle).await?)
    }
}
