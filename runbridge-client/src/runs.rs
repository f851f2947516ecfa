//! Run-related API endpoints

use reqwest::Method;
use runbridge_core::domain::run::{Run, RunHandle};
use runbridge_core::dto::run::{
    ListRunsQuery, RunIdRequest, RunList, RunOutput, RunSpec, SubmitRunResponse,
};
use tracing::debug;

use crate::PlatformClient;
use crate::error::{ClientError, Result};

/// Platform run id behind a handle
fn run_id(handle: &RunHandle) -> Result<i64> {
    handle
        .as_run_id()
        .ok_or_else(|| ClientError::InvalidRequest(format!("'{}' is not a valid run id", handle)))
}

impl PlatformClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Submit a one-off run
    ///
    /// # Arguments
    /// * `spec` - Cluster and task definition of the run
    ///
    /// # Returns
    /// The handle of the created run
    ///
    /// # Example
    /// ```no_run
    /// # use runbridge_client::PlatformClient;
    /// # use runbridge_core::dto::run::{RunSpec, SparkSubmitTask};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = PlatformClient::new("http://localhost:8085");
    /// let handle = client.submit_run(&RunSpec {
    ///     run_name: "spark-pi".to_string(),
    ///     spark_submit_task: Some(SparkSubmitTask {
    ///         parameters: vec!["--class".to_string(), "org.apache.spark.examples.SparkPi".to_string()],
    ///     }),
    ///     ..Default::default()
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_run(&self, spec: &RunSpec) -> Result<RunHandle> {
        debug!("Submitting run {}", spec.run_name);

        let response = self
            .request(Method::POST, "jobs/runs/submit")
            .json(spec)
            .send()
            .await?;

        let submitted: SubmitRunResponse = self.handle_response(response).await?;
        Ok(submitted.into())
    }

    /// Get a run by handle
    ///
    /// # Arguments
    /// * `handle` - The run handle
    ///
    /// # Returns
    /// The run document
    pub async fn get_run(&self, handle: &RunHandle) -> Result<Run> {
        self.find_run(handle)
            .await?
            .ok_or_else(|| ClientError::RunNotFound(handle.to_string()))
    }

    /// Get a run by handle, tolerating an empty response body
    pub(crate) async fn find_run(&self, handle: &RunHandle) -> Result<Option<Run>> {
        let run_id = run_id(handle)?;
        debug!("Getting run {}", run_id);

        let response = self
            .request(Method::GET, "jobs/runs/get")
            .query(&[("run_id", run_id)])
            .send()
            .await?;

        self.handle_optional_response(response).await
    }

    /// Get the output of a run together with its metadata
    pub async fn get_run_output(&self, handle: &RunHandle) -> Result<RunOutput> {
        let run_id = run_id(handle)?;

        let response = self
            .request(Method::GET, "jobs/runs/get-output")
            .query(&[("run_id", run_id)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List runs, most recently started first
    ///
    /// # Arguments
    /// * `query` - Optional filters; `active_only` and `completed_only` are exclusive
    pub async fn list_runs(&self, query: &ListRunsQuery) -> Result<RunList> {
        query.validate().map_err(ClientError::InvalidRequest)?;

        let response = self
            .request(Method::GET, "jobs/runs/list")
            .query(query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Cancel a run
    ///
    /// Cancelling a run that already finished is a no-op on the platform.
    pub async fn cancel_run(&self, handle: &RunHandle) -> Result<()> {
        let run_id = run_id(handle)?;
        debug!("Cancelling run {}", run_id);

        let response = self
            .request(Method::POST, "jobs/runs/cancel")
            .json(&RunIdRequest { run_id })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete a run
    pub async fn delete_run(&self, handle: &RunHandle) -> Result<()> {
        let run_id = run_id(handle)?;
        debug!("Deleting run {}", run_id);

        let response = self
            .request(Method::POST, "jobs/runs/delete")
            .json(&RunIdRequest { run_id })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Cancel a run and then delete it
    pub async fn cancel_and_delete_run(&self, handle: &RunHandle) -> Result<()> {
        self.cancel_run(handle).await?;
        self.delete_run(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_requires_numeric_handle() {
        assert_eq!(run_id(&RunHandle::from(12)).unwrap(), 12);
        assert!(matches!(
            run_id(&RunHandle::new("run-abc")),
            Err(ClientError::InvalidRequest(_))
        ));
    }
}
