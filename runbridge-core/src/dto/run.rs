//! Run DTOs for the platform's `jobs/runs` endpoints

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::run::{Run, RunHandle};

/// Request to submit a one-off run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSpec {
    pub run_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cluster: Option<NewCluster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_submit_task: Option<SparkSubmitTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_task: Option<NotebookTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Cluster created for the lifetime of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCluster {
    pub spark_version: String,
    pub node_type_id: String,
    pub num_workers: u32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub spark_conf: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub spark_env_vars: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparkSubmitTask {
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotebookTask {
    pub notebook_path: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub base_parameters: HashMap<String, String>,
}

/// Response to a run submit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRunResponse {
    pub run_id: i64,
}

impl From<SubmitRunResponse> for RunHandle {
    fn from(resp: SubmitRunResponse) -> Self {
        RunHandle::from(resp.run_id)
    }
}

/// Body of the cancel and delete requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunIdRequest {
    pub run_id: i64,
}

/// Filters for listing runs, most recently started first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRunsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Greater than 0 and less than 1000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListRunsQuery {
    /// Checks the combinations the platform rejects
    pub fn validate(&self) -> Result<(), String> {
        if self.active_only == Some(true) && self.completed_only == Some(true) {
            return Err("active_only and completed_only cannot both be true".to_string());
        }

        if let Some(limit) = self.limit {
            if limit == 0 || limit >= 1000 {
                return Err(format!("limit must be between 1 and 999 (got {})", limit));
            }
        }

        Ok(())
    }
}

/// Page of runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunList {
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub has_more: bool,
}

/// Output of a run together with its metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default)]
    pub metadata: Run,
    #[serde(default)]
    pub notebook_output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_trace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_rejects_active_and_completed() {
        let query = ListRunsQuery {
            active_only: Some(true),
            completed_only: Some(true),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_list_query_limit_bounds() {
        let mut query = ListRunsQuery::default();
        assert!(query.validate().is_ok());

        query.limit = Some(0);
        assert!(query.validate().is_err());

        query.limit = Some(1000);
        assert!(query.validate().is_err());

        query.limit = Some(999);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_run_spec_omits_unset_fields() {
        let spec = RunSpec {
            run_name: "run-1".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, serde_json::json!({ "run_name": "run-1" }));
    }
}
