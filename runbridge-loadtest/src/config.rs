//! Harness configuration
//!
//! Command-line arguments (each with an environment variable fallback) and
//! the validated configuration derived from them.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use runbridge_core::dto::run::RunSpec;
use runbridge_core::lifecycle::PollPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Which sequence each simulated user performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    /// Submit a run, wait for it to complete, delete it
    SubmitDelete,
    /// Diagnostic no-ops that exercise the harness without the platform
    Noop,
}

/// Load-generation harness for the platform's run API
#[derive(Debug, Clone, Parser)]
#[command(name = "runbridge-loadtest")]
#[command(about = "Drive concurrent submit/await/delete run workflows", long_about = None)]
pub struct Args {
    /// Platform base URL
    #[arg(
        long,
        env = "RUNBRIDGE_PLATFORM_URL",
        default_value = "http://localhost:8085"
    )]
    pub platform_url: String,

    /// Personal access token
    #[arg(long, env = "RUNBRIDGE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Scenario each user runs
    #[arg(long, value_enum, env = "RUNBRIDGE_SCENARIO", default_value_t = ScenarioKind::SubmitDelete)]
    pub scenario: ScenarioKind,

    /// Number of concurrent simulated users
    #[arg(long, env = "RUNBRIDGE_USERS", default_value_t = 1)]
    pub users: usize,

    /// Scenario iterations per user
    #[arg(long, env = "RUNBRIDGE_ITERATIONS", default_value_t = 1)]
    pub iterations: usize,

    /// Polls before a run is considered stuck
    #[arg(long, env = "RUNBRIDGE_MAX_ATTEMPTS", default_value_t = 40)]
    pub max_attempts: u32,

    /// Seconds between polls
    #[arg(long, env = "RUNBRIDGE_POLL_INTERVAL", default_value_t = 10.0)]
    pub poll_interval: f64,

    /// Minimum think time between iterations, in seconds
    #[arg(long, env = "RUNBRIDGE_WAIT_MIN", default_value_t = 1)]
    pub wait_min: u64,

    /// Maximum think time between iterations, in seconds
    #[arg(long, env = "RUNBRIDGE_WAIT_MAX", default_value_t = 5)]
    pub wait_max: u64,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, env = "RUNBRIDGE_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// JSON run spec to submit instead of the built-in SparkPi job
    #[arg(long, env = "RUNBRIDGE_SPEC_FILE")]
    pub spec_file: Option<PathBuf>,

    /// Exit with an error if any request failed
    #[arg(long)]
    pub fail_on_error: bool,
}

/// Validated harness configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform base URL (e.g., "https://adb-123.azuredatabricks.net")
    pub platform_url: String,

    pub token: Option<String>,

    pub scenario: ScenarioKind,

    pub users: usize,

    pub iterations: usize,

    /// Budget for awaiting each submitted run
    pub poll_policy: PollPolicy,

    /// Think time range between iterations of one user
    pub wait_min: Duration,
    pub wait_max: Duration,

    pub request_timeout: Duration,

    /// Overrides the built-in run template
    pub run_template: Option<RunSpec>,

    pub fail_on_error: bool,
}

impl Config {
    /// Builds the configuration from parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let poll_policy = PollPolicy::from_secs_f64(args.max_attempts, args.poll_interval)
            .context("Invalid poll budget")?;

        let run_template = args
            .spec_file
            .as_deref()
            .map(|path| -> Result<RunSpec> {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read run spec {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse run spec {}", path.display()))
            })
            .transpose()?;

        let config = Self {
            platform_url: args.platform_url,
            token: args.token,
            scenario: args.scenario,
            users: args.users,
            iterations: args.iterations,
            poll_policy,
            wait_min: Duration::from_secs(args.wait_min),
            wait_max: Duration::from_secs(args.wait_max),
            request_timeout: Duration::from_secs(args.request_timeout),
            run_template,
            fail_on_error: args.fail_on_error,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.platform_url.is_empty() {
            anyhow::bail!("platform_url cannot be empty");
        }

        if !self.platform_url.starts_with("http://") && !self.platform_url.starts_with("https://")
        {
            anyhow::bail!("platform_url must start with http:// or https://");
        }

        if self.users == 0 {
            anyhow::bail!("users must be greater than 0");
        }

        if self.iterations == 0 {
            anyhow::bail!("iterations must be greater than 0");
        }

        if self.wait_min > self.wait_max {
            anyhow::bail!("wait_min must not exceed wait_max");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}
