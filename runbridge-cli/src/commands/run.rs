//! Run command handlers
//!
//! Handles submitting, inspecting, waiting on and cleaning up one-off runs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::*;
use runbridge_client::PlatformClient;
use runbridge_core::domain::run::{LifecycleState, Run, RunHandle, RunStatus};
use runbridge_core::dto::run::{ListRunsQuery, RunOutput, RunSpec};
use runbridge_core::lifecycle::{PollError, PollPolicy, RunLifecycleMonitor};
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Submit a run from a JSON spec file
    Submit {
        /// Path to the run spec
        file: PathBuf,

        /// Wait for the run to reach a terminal state
        #[arg(short, long)]
        wait: bool,

        #[command(flatten)]
        budget: PollBudget,
    },
    /// List runs
    List {
        /// Only runs of this job
        #[arg(long)]
        job_id: Option<i64>,

        /// Only runs that are still active
        #[arg(long, conflicts_with = "completed_only")]
        active_only: bool,

        /// Only runs that have finished
        #[arg(long)]
        completed_only: bool,

        /// Number of runs to skip
        #[arg(long)]
        offset: Option<u32>,

        /// Maximum number of runs to return (1-999)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Get run details
    Get {
        /// Run ID
        id: String,
    },
    /// Get run output
    Output {
        /// Run ID
        id: String,
    },
    /// Cancel a run
    Cancel {
        /// Run ID
        id: String,
    },
    /// Cancel and delete a run
    Delete {
        /// Run ID
        id: String,
    },
    /// Wait for a run to reach a terminal state
    Wait {
        /// Run ID
        id: String,

        #[command(flatten)]
        budget: PollBudget,
    },
}

/// Poll budget flags shared by `submit --wait` and `wait`
#[derive(Debug, Clone, clap::Args)]
pub struct PollBudget {
    /// Polls before giving up
    #[arg(long, default_value_t = 40)]
    max_attempts: u32,

    /// Seconds between polls
    #[arg(long, default_value_t = 10.0)]
    interval: f64,
}

impl PollBudget {
    fn policy(&self) -> Result<PollPolicy> {
        PollPolicy::from_secs_f64(self.max_attempts, self.interval).context("Invalid poll budget")
    }
}

/// Handle run commands
///
/// # Arguments
/// * `command` - The run command to execute
/// * `config` - The CLI configuration
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        RunCommands::Submit { file, wait, budget } => {
            let spec = load_spec(&file)?;
            let policy = if wait { Some(budget.policy()?) } else { None };
            submit_run(client, &spec, policy).await
        }
        RunCommands::List {
            job_id,
            active_only,
            completed_only,
            offset,
            limit,
        } => {
            let query = ListRunsQuery {
                job_id,
                active_only: active_only.then_some(true),
                completed_only: completed_only.then_some(true),
                offset,
                limit,
            };
            list_runs(&client, &query).await
        }
        RunCommands::Get { id } => get_run(&client, &RunHandle::new(id)).await,
        RunCommands::Output { id } => get_run_output(&client, &RunHandle::new(id)).await,
        RunCommands::Cancel { id } => cancel_run(&client, &RunHandle::new(id)).await,
        RunCommands::Delete { id } => delete_run(&client, &RunHandle::new(id)).await,
        RunCommands::Wait { id, budget } => {
            let policy = budget.policy()?;
            wait_for_run(client, &RunHandle::new(id), &policy).await
        }
    }
}

/// Read a run spec from a JSON file
fn load_spec(path: &Path) -> Result<RunSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Submit a run, optionally waiting for it to finish
async fn submit_run(
    client: PlatformClient,
    spec: &RunSpec,
    wait: Option<PollPolicy>,
) -> Result<()> {
    let handle = client
        .submit_run(spec)
        .await
        .with_context(|| format!("Failed to submit run {}", spec.run_name))?;

    println!("{}", "✓ Run submitted".green());
    println!("  ID:   {}", handle.to_string().cyan());
    println!("  Name: {}", spec.run_name);

    match wait {
        Some(policy) => wait_for_run(client, &handle, &policy).await,
        None => Ok(()),
    }
}

/// Poll a run until it finishes or the budget runs out
async fn wait_for_run(
    client: PlatformClient,
    handle: &RunHandle,
    policy: &PollPolicy,
) -> Result<()> {
    println!(
        "{}",
        format!(
            "Waiting for run {} (up to {} polls, every {:?})...",
            handle,
            policy.max_attempts(),
            policy.interval()
        )
        .dimmed()
    );

    let monitor = RunLifecycleMonitor::new(client);
    match monitor.await_completion(handle, policy).await {
        Ok(status) => {
            print_status("✓ Run completed", &status);
            Ok(())
        }
        Err(e @ PollError::RunFailed { .. }) => {
            println!("{}", format!("✗ {}", e).red());
            Err(e.into())
        }
        Err(e) if e.is_timeout() => {
            println!("{}", format!("⚠ {}", e).yellow());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// List runs
async fn list_runs(client: &PlatformClient, query: &ListRunsQuery) -> Result<()> {
    let list = client.list_runs(query).await?;

    if list.runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", list.runs.len()).bold());
        println!();
        for run in &list.runs {
            print_run_summary(run);
        }
        if list.has_more {
            println!("{}", "More runs available, use --offset to page.".dimmed());
        }
    }

    Ok(())
}

/// Get and display a single run
async fn get_run(client: &PlatformClient, handle: &RunHandle) -> Result<()> {
    let run = client.get_run(handle).await?;
    print_run_details(&run);
    Ok(())
}

/// Get and display the output of a run
async fn get_run_output(client: &PlatformClient, handle: &RunHandle) -> Result<()> {
    let output = client.get_run_output(handle).await?;
    print_run_output(&output)?;
    Ok(())
}

async fn cancel_run(client: &PlatformClient, handle: &RunHandle) -> Result<()> {
    client.cancel_run(handle).await?;
    println!("{}", format!("✓ Cancel requested for run {}", handle).green());
    Ok(())
}

/// Cancel and delete a run; a run that no longer exists counts as deleted
async fn delete_run(client: &PlatformClient, handle: &RunHandle) -> Result<()> {
    match client.cancel_and_delete_run(handle).await {
        Ok(()) => println!("{}", format!("✓ Run {} deleted", handle).green()),
        Err(e) if e.is_not_found() => {
            println!("{}", format!("⚠ Run {} does not exist", handle).yellow())
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Print a one-block summary of a run
fn print_run_summary(run: &Run) {
    let id = run
        .run_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("  {} Run {}", "▸".cyan(), id.dimmed());
    if let Some(name) = &run.run_name {
        println!("    Name:    {}", name);
    }
    println!("    State:   {}", colorize_state(run.life_cycle_state()));
    if let Some(started) = run.start_time.and_then(format_millis) {
        println!("    Started: {}", started.dimmed());
    }
    println!();
}

/// Print detailed run information
fn print_run_details(run: &Run) {
    println!("{}", "Run Details:".bold());
    if let Some(id) = run.run_id {
        println!("  ID:          {}", id.to_string().cyan());
    }
    if let Some(job_id) = run.job_id {
        println!("  Job ID:      {}", job_id.to_string().dimmed());
    }
    if let Some(name) = &run.run_name {
        println!("  Name:        {}", name);
    }
    println!("  State:       {}", colorize_state(run.life_cycle_state()));

    if let Some(state) = &run.state {
        if let Some(result) = &state.result_state {
            println!("  Result:      {}", colorize_result(result));
        }
        if let Some(message) = state.state_message.as_deref().filter(|m| !m.is_empty()) {
            println!("  Message:     {}", message.dimmed());
        }
    }

    if let Some(started) = run.start_time.and_then(format_millis) {
        println!("  Started:     {}", started);
    }

    let phases = [
        ("Setup", run.setup_duration),
        ("Execution", run.execution_duration),
        ("Cleanup", run.cleanup_duration),
    ];
    for (label, millis) in phases {
        if let Some(millis) = millis {
            println!("  {:<12} {}s", format!("{}:", label), millis / 1000);
        }
    }

    if let Some(url) = &run.run_page_url {
        println!("  URL:         {}", url.underline());
    }
}

fn print_run_output(output: &RunOutput) -> Result<()> {
    print_run_details(&output.metadata);

    if let Some(notebook) = &output.notebook_output {
        println!("\n{}", "Notebook output:".bold());
        println!("{}", serde_json::to_string_pretty(notebook)?);
    }

    if let Some(error) = &output.error {
        println!("\n{}", "Error:".bold());
        println!("  {}", error.red());
        if let Some(trace) = &output.error_trace {
            println!("{}", "─".repeat(80).dimmed());
            println!("{}", trace.dimmed());
            println!("{}", "─".repeat(80).dimmed());
        }
    }

    Ok(())
}

fn print_status(headline: &str, status: &RunStatus) {
    println!("{}", headline.green());
    println!("  State:  {}", colorize_state(status.life_cycle_state.as_ref()));
    if let Some(result) = &status.result_state {
        println!("  Result: {}", colorize_result(result));
    }
}

/// Epoch milliseconds as a UTC timestamp
fn format_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Colorize a lifecycle state for display
fn colorize_state(state: Option<&LifecycleState>) -> ColoredString {
    match state {
        None => "unknown".dimmed(),
        Some(LifecycleState::Pending) => "PENDING".yellow(),
        Some(LifecycleState::Running) => "RUNNING".blue(),
        Some(LifecycleState::Terminating) => "TERMINATING".blue(),
        Some(LifecycleState::Terminated) => "TERMINATED".green(),
        Some(state @ (LifecycleState::Skipped | LifecycleState::InternalError)) => {
            state.as_str().red()
        }
        Some(other) => other.as_str().normal(),
    }
}

fn colorize_result(result: &str) -> ColoredString {
    match result {
        "SUCCESS" => result.green(),
        "FAILED" | "TIMEDOUT" => result.red(),
        "CANCELED" => result.yellow(),
        _ => result.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_spec() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"run_name": "adhoc", "existing_cluster_id": "0923-164208-meows279"}}"#
        )
        .unwrap();

        let spec = load_spec(file.path()).unwrap();
        assert_eq!(spec.run_name, "adhoc");
        assert_eq!(spec.existing_cluster_id.as_deref(), Some("0923-164208-meows279"));
    }

    #[test]
    fn test_load_spec_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_spec(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(
            format_millis(1_556_000_000_000).as_deref(),
            Some("2019-04-23 06:13:20")
        );
    }

    #[test]
    fn test_poll_budget() {
        let budget = PollBudget {
            max_attempts: 0,
            interval: 1.0,
        };
        assert!(budget.policy().is_err());

        let budget = PollBudget {
            max_attempts: 3,
            interval: 0.5,
        };
        assert_eq!(budget.policy().unwrap().max_attempts(), 3);
    }
}
