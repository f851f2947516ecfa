//! Request instrumentation
//!
//! Timing and success/failure recording around every external call the
//! harness makes. This is a wrapper at the call site, kept apart from the
//! lifecycle monitor: [`Instrumented`] wraps a [`RunPlatform`] and [`timed`]
//! wraps any other fallible future.

use async_trait::async_trait;
use runbridge_core::domain::run::{RunHandle, RunStatus};
use runbridge_core::dto::run::RunSpec;
use runbridge_core::lifecycle::{BoxError, RunPlatform};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Samples {
    /// Elapsed milliseconds of every request, successful or not
    latencies: Vec<u64>,
    failures: usize,
    /// Error message -> occurrences
    errors: HashMap<String, usize>,
}

/// Aggregated figures for one request name
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSummary {
    pub name: String,
    pub num_requests: usize,
    pub num_failures: usize,
    pub min_ms: u64,
    pub max_ms: u64,
    pub avg_ms: f64,
    pub median_ms: u64,
}

/// Shared, thread-safe collector of request outcomes
#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    inner: Arc<Mutex<BTreeMap<String, Samples>>>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, name: &str, elapsed: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let samples = inner.entry(name.to_string()).or_default();
        samples.latencies.push(elapsed.as_millis() as u64);
    }

    pub fn record_failure(&self, name: &str, elapsed: Duration, error: impl Display) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let samples = inner.entry(name.to_string()).or_default();
        samples.latencies.push(elapsed.as_millis() as u64);
        samples.failures += 1;
        *samples.errors.entry(error.to_string()).or_default() += 1;
    }

    /// Per-name summaries, sorted by name
    pub fn summaries(&self) -> Vec<RequestSummary> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .iter()
            .map(|(name, samples)| summarize(name, samples))
            .collect()
    }

    /// Distinct errors as (request name, message, occurrences)
    pub fn errors(&self) -> Vec<(String, String, usize)> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut errors: Vec<_> = inner
            .iter()
            .flat_map(|(name, samples)| {
                samples
                    .errors
                    .iter()
                    .map(move |(msg, count)| (name.clone(), msg.clone(), *count))
            })
            .collect();
        errors.sort();
        errors
    }

    pub fn total_requests(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.values().map(|s| s.latencies.len()).sum()
    }

    pub fn total_failures(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.values().map(|s| s.failures).sum()
    }

    /// Failed share of all requests, 0.0 when nothing was recorded
    pub fn fail_ratio(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        self.total_failures() as f64 / total as f64
    }
}

fn summarize(name: &str, samples: &Samples) -> RequestSummary {
    let mut sorted = samples.latencies.clone();
    sorted.sort_unstable();

    let count = sorted.len();
    let total: u64 = sorted.iter().sum();

    RequestSummary {
        name: name.to_string(),
        num_requests: count,
        num_failures: samples.failures,
        min_ms: sorted.first().copied().unwrap_or(0),
        max_ms: sorted.last().copied().unwrap_or(0),
        avg_ms: if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        },
        median_ms: if count == 0 { 0 } else { sorted[count / 2] },
    }
}

/// Awaits `fut`, recording its duration and outcome under `name`
pub async fn timed<T, E, F>(stats: &RequestStats, name: &str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let result = fut.await;
    let elapsed = started.elapsed();

    match &result {
        Ok(_) => {
            debug!(request = name, elapsed_ms = elapsed.as_millis() as u64, "request succeeded");
            stats.record_success(name, elapsed);
        }
        Err(e) => {
            warn!(request = name, elapsed_ms = elapsed.as_millis() as u64, error = %e, "request failed");
            stats.record_failure(name, elapsed, e);
        }
    }

    result
}

/// [`RunPlatform`] that records every call into [`RequestStats`]
pub struct Instrumented<P> {
    inner: P,
    stats: RequestStats,
}

impl<P: RunPlatform> Instrumented<P> {
    pub fn new(inner: P, stats: RequestStats) -> Self {
        Self { inner, stats }
    }
}

#[async_trait]
impl<P: RunPlatform> RunPlatform for Instrumented<P> {
    async fn submit_run(&self, spec: &RunSpec) -> Result<RunHandle, BoxError> {
        timed(&self.stats, "create_run", self.inner.submit_run(spec)).await
    }

    async fn fetch_run_status(&self, handle: &RunHandle) -> Result<Option<RunStatus>, BoxError> {
        timed(&self.stats, "get_run", self.inner.fetch_run_status(handle)).await
    }

    async fn delete_run(&self, handle: &RunHandle) -> Result<(), BoxError> {
        timed(&self.stats, "delete_run", self.inner.delete_run(handle)).await
    }
}
