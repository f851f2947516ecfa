//! Diagnostic no-op scenario
//!
//! Exercises users, think times, instrumentation and reporting without
//! touching the platform. The third step always fails so the failure path of
//! the report can be checked too.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::info;

use super::UserScenario;
use crate::instrument::{RequestStats, timed};

pub struct NoopScenario {
    stats: RequestStats,
}

impl NoopScenario {
    pub fn new(stats: RequestStats) -> Self {
        Self { stats }
    }
}

fn short_delay() -> Duration {
    Duration::from_secs(rand::thread_rng().gen_range(1..=5))
}

async fn noop_with_delay(delay: Duration) -> Result<()> {
    info!("NoOp With Delay: STARTED");
    tokio::time::sleep(delay).await;
    info!("NoOp With Delay: COMPLETE");
    Ok(())
}

async fn noop_with_fail() -> Result<()> {
    Err(anyhow!("Stuff happened"))
}

#[async_trait]
impl UserScenario for NoopScenario {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn run_once(&self, _user: usize) -> Result<()> {
        let _ = timed(&self.stats, "noop_with_delay", noop_with_delay(short_delay())).await;
        let _ = timed(
            &self.stats,
            "noop",
            noop_with_delay(Duration::from_millis(500)),
        )
        .await;
        let _ = timed(&self.stats, "noop_with_fail", noop_with_fail()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_noop_records_each_step() {
        let stats = RequestStats::new();
        let scenario = NoopScenario::new(stats.clone());

        scenario.run_once(0).await.unwrap();

        let summaries = stats.summaries();
        let names: Vec<_> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["noop", "noop_with_delay", "noop_with_fail"]);
        assert_eq!(stats.total_failures(), 1);
        assert_eq!(
            stats.errors(),
            vec![("noop_with_fail".to_string(), "Stuff happened".to_string(), 1)]
        );
    }
}
