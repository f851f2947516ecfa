//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a submitted run
///
/// Assigned by the platform on submit and never mutated afterwards. The
/// platform uses integer ids; the handle keeps the textual form so callers
/// can carry it around without caring about the representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunHandle(String);

impl RunHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric platform id, if the handle holds one
    pub fn as_run_id(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl From<i64> for RunHandle {
    fn from(run_id: i64) -> Self {
        Self(run_id.to_string())
    }
}

impl From<&str> for RunHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RunHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state label reported by the platform
///
/// Labels the platform may add later are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Pending,
    Running,
    Terminating,
    Terminated,
    Skipped,
    InternalError,
    Other(String),
}

impl LifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Pending => "PENDING",
            LifecycleState::Running => "RUNNING",
            LifecycleState::Terminating => "TERMINATING",
            LifecycleState::Terminated => "TERMINATED",
            LifecycleState::Skipped => "SKIPPED",
            LifecycleState::InternalError => "INTERNAL_ERROR",
            LifecycleState::Other(label) => label,
        }
    }
}

impl From<String> for LifecycleState {
    fn from(label: String) -> Self {
        match label.as_str() {
            "PENDING" => LifecycleState::Pending,
            "RUNNING" => LifecycleState::Running,
            "TERMINATING" => LifecycleState::Terminating,
            "TERMINATED" => LifecycleState::Terminated,
            "SKIPPED" => LifecycleState::Skipped,
            "INTERNAL_ERROR" => LifecycleState::InternalError,
            _ => LifecycleState::Other(label),
        }
    }
}

impl From<&str> for LifecycleState {
    fn from(label: &str) -> Self {
        LifecycleState::from(label.to_string())
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State block of a run document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_cycle_state: Option<LifecycleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_message: Option<String>,
}

/// Run document as returned by the platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub run_id: Option<i64>,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub run_name: Option<String>,
    #[serde(default)]
    pub state: Option<RunState>,
    /// Epoch milliseconds
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub setup_duration: Option<i64>,
    #[serde(default)]
    pub execution_duration: Option<i64>,
    #[serde(default)]
    pub cleanup_duration: Option<i64>,
    #[serde(default)]
    pub run_page_url: Option<String>,
    #[serde(default)]
    pub run_type: Option<String>,
    /// Fields this crate does not model
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Run {
    pub fn handle(&self) -> Option<RunHandle> {
        self.run_id.map(RunHandle::from)
    }

    pub fn life_cycle_state(&self) -> Option<&LifecycleState> {
        self.state.as_ref()?.life_cycle_state.as_ref()
    }
}

/// Snapshot of a run's status taken by a single poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub life_cycle_state: Option<LifecycleState>,
    pub result_state: Option<String>,
    pub state_message: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl RunStatus {
    /// Snapshot carrying only a lifecycle state
    pub fn with_state(state: impl Into<LifecycleState>) -> Self {
        Self {
            life_cycle_state: Some(state.into()),
            result_state: None,
            state_message: None,
            observed_at: Utc::now(),
        }
    }

    /// Snapshot of a run that reports no state yet
    pub fn stateless() -> Self {
        Self {
            life_cycle_state: None,
            result_state: None,
            state_message: None,
            observed_at: Utc::now(),
        }
    }
}

impl From<&Run> for RunStatus {
    fn from(run: &Run) -> Self {
        let state = run.state.clone().unwrap_or_default();
        Self {
            life_cycle_state: state.life_cycle_state,
            result_state: state.result_state,
            state_message: state.state_message,
            observed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_state_known_labels() {
        assert_eq!(LifecycleState::from("TERMINATED"), LifecycleState::Terminated);
        assert_eq!(
            LifecycleState::from("INTERNAL_ERROR"),
            LifecycleState::InternalError
        );
        assert_eq!(LifecycleState::from("SKIPPED").to_string(), "SKIPPED");
    }

    #[test]
    fn test_lifecycle_state_keeps_unknown_label() {
        let state = LifecycleState::from("wibble");
        assert_eq!(state, LifecycleState::Other("wibble".to_string()));
        assert_eq!(state.as_str(), "wibble");
        assert_eq!(String::from(state), "wibble");
    }

    #[test]
    fn test_lifecycle_state_is_case_sensitive() {
        assert_eq!(
            LifecycleState::from("terminated"),
            LifecycleState::Other("terminated".to_string())
        );
    }

    #[test]
    fn test_run_deserializes_platform_document() {
        let json = serde_json::json!({
            "run_id": 42,
            "job_id": 7,
            "run_name": "run-abc",
            "state": {
                "life_cycle_state": "RUNNING",
                "state_message": "In run"
            },
            "cluster_instance": { "cluster_id": "1201-my-cluster" }
        });

        let run: Run = serde_json::from_value(json).unwrap();
        assert_eq!(run.handle(), Some(RunHandle::from(42)));
        assert_eq!(run.life_cycle_state(), Some(&LifecycleState::Running));
        assert!(run.extra.contains_key("cluster_instance"));

        let status = RunStatus::from(&run);
        assert_eq!(status.life_cycle_state, Some(LifecycleState::Running));
        assert_eq!(status.state_message.as_deref(), Some("In run"));
    }

    #[test]
    fn test_run_without_state_yields_stateless_status() {
        let run: Run = serde_json::from_value(serde_json::json!({ "wibble": "wobble" })).unwrap();
        let status = RunStatus::from(&run);
        assert!(status.life_cycle_state.is_none());
    }

    #[test]
    fn test_handle_run_id() {
        assert_eq!(RunHandle::from(5).as_run_id(), Some(5));
        assert_eq!(RunHandle::new("run-abc").as_run_id(), None);
    }
}
