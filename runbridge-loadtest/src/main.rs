//! Runbridge load harness
//!
//! Simulates concurrent users that each submit a run to the platform, wait
//! for it to reach a terminal state and delete it. Every platform call is
//! timed and the aggregated figures are printed when all users finish.
//!
//! Architecture:
//! - Configuration: command-line arguments with environment fallbacks
//! - Instrumentation: timing wrapper around the platform client
//! - Scenarios: the steps one user performs per iteration
//! - Swarm: user tasks and think times

mod config;
mod instrument;
mod report;
mod scenario;
mod swarm;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Args, Config, ScenarioKind};
use crate::instrument::{Instrumented, RequestStats};
use crate::scenario::{NoopScenario, SubmitDeleteScenario, UserScenario, spark_pi_template};
use crate::swarm::Swarm;
use runbridge_client::PlatformClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runbridge_loadtest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_args(Args::parse())?;
    info!(
        "Loaded configuration: platform_url={}, scenario={:?}, users={}, iterations={}",
        config.platform_url, config.scenario, config.users, config.iterations
    );

    let stats = RequestStats::new();
    let scenario = build_scenario(&config, stats.clone())?;

    let started = Instant::now();
    let outcome = Swarm::new(scenario, config.users, config.iterations)
        .with_wait(config.wait_min, config.wait_max)
        .run()
        .await;

    print!("{}", report::render(&stats, &outcome, started.elapsed()));

    if config.fail_on_error && stats.total_failures() > 0 {
        anyhow::bail!("{} request(s) failed", stats.total_failures());
    }

    Ok(())
}

fn build_scenario(config: &Config, stats: RequestStats) -> Result<Arc<dyn UserScenario>> {
    match config.scenario {
        ScenarioKind::Noop => Ok(Arc::new(NoopScenario::new(stats))),
        ScenarioKind::SubmitDelete => {
            let http = reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .context("Failed to build HTTP client")?;

            let mut client = PlatformClient::with_client(config.platform_url.clone(), http);
            if let Some(token) = &config.token {
                client = client.with_token(token.clone());
            }
            info!("Platform client initialized");

            let template = config
                .run_template
                .clone()
                .unwrap_or_else(spark_pi_template);

            Ok(Arc::new(SubmitDeleteScenario::new(
                Instrumented::new(client, stats.clone()),
                config.poll_policy,
                stats,
                template,
            )))
        }
    }
}
