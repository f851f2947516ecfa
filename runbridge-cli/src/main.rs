//! Runbridge CLI
//!
//! Command-line interface for one-off runs on the platform.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "runbridge")]
#[command(about = "Submit, inspect and clean up platform runs", long_about = None)]
struct Cli {
    /// Platform base URL
    #[arg(
        long,
        env = "RUNBRIDGE_PLATFORM_URL",
        default_value = "http://localhost:8085"
    )]
    platform_url: String,

    /// Personal access token
    #[arg(long, env = "RUNBRIDGE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runbridge_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        platform_url: cli.platform_url,
        token: cli.token,
    };

    handle_command(cli.command, &config).await
}
