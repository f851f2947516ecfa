//! Simulated users
//!
//! Spawns one task per user. Each user runs its scenario for the configured
//! number of iterations, pausing for a random think time between them.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::scenario::UserScenario;

/// Iteration counts after a swarm has finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwarmOutcome {
    pub iterations: usize,
    /// Iterations whose scenario returned an error
    pub aborted: usize,
}

pub struct Swarm {
    scenario: Arc<dyn UserScenario>,
    users: usize,
    iterations: usize,
    wait_min: Duration,
    wait_max: Duration,
}

impl Swarm {
    pub fn new(scenario: Arc<dyn UserScenario>, users: usize, iterations: usize) -> Self {
        Self {
            scenario,
            users,
            iterations,
            wait_min: Duration::ZERO,
            wait_max: Duration::ZERO,
        }
    }

    /// Think time range between two iterations of one user
    pub fn with_wait(mut self, min: Duration, max: Duration) -> Self {
        self.wait_min = min;
        self.wait_max = max.max(min);
        self
    }

    /// Runs every user to completion
    pub async fn run(&self) -> SwarmOutcome {
        info!(
            "Starting {} user(s) x {} iteration(s) of {}",
            self.users,
            self.iterations,
            self.scenario.name()
        );

        let handles: Vec<_> = (0..self.users).map(|user| self.spawn_user(user)).collect();

        let mut outcome = SwarmOutcome::default();
        for handle in handles {
            match handle.await {
                Ok(user_outcome) => {
                    outcome.iterations += user_outcome.iterations;
                    outcome.aborted += user_outcome.aborted;
                }
                Err(e) => warn!("User task panicked: {}", e),
            }
        }

        info!(
            "Swarm finished: {} iteration(s), {} aborted",
            outcome.iterations, outcome.aborted
        );
        outcome
    }

    fn spawn_user(&self, user: usize) -> JoinHandle<SwarmOutcome> {
        let scenario = Arc::clone(&self.scenario);
        let iterations = self.iterations;
        let (wait_min, wait_max) = (self.wait_min, self.wait_max);

        tokio::spawn(async move {
            let mut outcome = SwarmOutcome::default();

            for iteration in 0..iterations {
                outcome.iterations += 1;
                if let Err(e) = scenario.run_once(user).await {
                    error!(user, iteration, "Iteration aborted: {:#}", e);
                    outcome.aborted += 1;
                }

                if iteration + 1 < iterations {
                    let pause = think_time(wait_min, wait_max);
                    debug!(user, "Thinking for {:?}", pause);
                    tokio::time::sleep(pause).await;
                }
            }

            outcome
        })
    }
}

/// Uniformly random pause in `[min, max]`, at millisecond resolution
fn think_time(min: Duration, max: Duration) -> Duration {
    let min_ms = min.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    if max_ms <= min_ms {
        return min;
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{Instrumented, RequestStats};
    use crate::scenario::{AWAIT_REQUEST, SubmitDeleteScenario, spark_pi_template};
    use async_trait::async_trait;
    use runbridge_core::domain::run::{LifecycleState, RunHandle, RunStatus};
    use runbridge_core::dto::run::RunSpec;
    use runbridge_core::lifecycle::{BoxError, PollPolicy, RunPlatform};
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Platform whose runs stay in one lifecycle state forever
    #[derive(Default)]
    struct MemoryPlatform {
        final_state: Option<LifecycleState>,
        fail_submit: bool,
        fail_fetch: bool,
        fail_delete: bool,
        next_id: AtomicUsize,
        submitted: Mutex<Vec<String>>,
        deleted: Mutex<Vec<RunHandle>>,
    }

    #[async_trait]
    impl RunPlatform for MemoryPlatform {
        async fn submit_run(&self, spec: &RunSpec) -> Result<RunHandle, BoxError> {
            if self.fail_submit {
                return Err("quota exceeded".into());
            }
            self.submitted.lock().unwrap().push(spec.run_name.clone());
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            Ok(RunHandle::from(id))
        }

        async fn fetch_run_status(
            &self,
            _handle: &RunHandle,
        ) -> Result<Option<RunStatus>, BoxError> {
            if self.fail_fetch {
                return Err("connection reset".into());
            }
            Ok(Some(match &self.final_state {
                Some(state) => RunStatus::with_state(state.clone()),
                None => RunStatus::with_state(LifecycleState::Running),
            }))
        }

        async fn delete_run(&self, handle: &RunHandle) -> Result<(), BoxError> {
            if self.fail_delete {
                return Err("delete refused".into());
            }
            self.deleted.lock().unwrap().push(handle.clone());
            Ok(())
        }
    }

    fn swarm_over(
        platform: Arc<MemoryPlatform>,
        attempts: u32,
        users: usize,
        iterations: usize,
    ) -> (Swarm, RequestStats) {
        let stats = RequestStats::new();
        let policy = PollPolicy::new(attempts, Duration::from_secs(10)).unwrap();
        let scenario = SubmitDeleteScenario::new(
            Instrumented::new(platform, stats.clone()),
            policy,
            stats.clone(),
            spark_pi_template(),
        );
        (Swarm::new(Arc::new(scenario), users, iterations), stats)
    }

    fn summary_count(stats: &RequestStats, name: &str) -> (usize, usize) {
        stats
            .summaries()
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| (s.num_requests, s.num_failures))
            .unwrap_or((0, 0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_runs_are_deleted() {
        let platform = Arc::new(MemoryPlatform {
            final_state: Some(LifecycleState::Terminated),
            ..Default::default()
        });
        let (swarm, stats) = swarm_over(Arc::clone(&platform), 40, 3, 2);

        let outcome = swarm.run().await;

        assert_eq!(outcome, SwarmOutcome { iterations: 6, aborted: 0 });
        assert_eq!(platform.deleted.lock().unwrap().len(), 6);
        assert_eq!(summary_count(&stats, "create_run"), (6, 0));
        assert_eq!(summary_count(&stats, AWAIT_REQUEST), (6, 0));
        assert_eq!(summary_count(&stats, "delete_run"), (6, 0));
        assert_eq!(stats.total_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_iteration_uses_a_fresh_run_name() {
        let platform = Arc::new(MemoryPlatform {
            final_state: Some(LifecycleState::Terminated),
            ..Default::default()
        });
        let (swarm, _stats) = swarm_over(Arc::clone(&platform), 40, 1, 3);

        swarm.run().await;

        let names = platform.submitted.lock().unwrap().clone();
        assert!(names.iter().all(|n| n.starts_with("run-")));
        let distinct: BTreeSet<_> = names.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_create_aborts_iteration() {
        let platform = Arc::new(MemoryPlatform {
            fail_submit: true,
            ..Default::default()
        });
        let (swarm, stats) = swarm_over(Arc::clone(&platform), 40, 2, 1);

        let outcome = swarm.run().await;

        assert_eq!(outcome.aborted, 2);
        assert_eq!(summary_count(&stats, "create_run"), (2, 2));
        assert_eq!(summary_count(&stats, AWAIT_REQUEST), (0, 0));
        assert!(platform.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_run_is_recorded_and_still_deleted() {
        let platform = Arc::new(MemoryPlatform::default());
        let (swarm, stats) = swarm_over(Arc::clone(&platform), 3, 1, 1);

        let outcome = swarm.run().await;

        assert_eq!(outcome.aborted, 0);
        assert_eq!(summary_count(&stats, "get_run"), (3, 0));
        assert_eq!(summary_count(&stats, AWAIT_REQUEST), (1, 1));
        assert_eq!(platform.deleted.lock().unwrap().as_slice(), &[RunHandle::from(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_is_recorded_and_still_deleted() {
        let platform = Arc::new(MemoryPlatform {
            final_state: Some(LifecycleState::InternalError),
            ..Default::default()
        });
        let (swarm, stats) = swarm_over(Arc::clone(&platform), 40, 1, 1);

        swarm.run().await;

        assert_eq!(summary_count(&stats, AWAIT_REQUEST), (1, 1));
        let errors = stats.errors();
        assert!(errors[0].1.contains("INTERNAL_ERROR"));
        assert_eq!(platform.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_aborts_iteration_without_delete() {
        let platform = Arc::new(MemoryPlatform {
            fail_fetch: true,
            ..Default::default()
        });
        let (swarm, stats) = swarm_over(Arc::clone(&platform), 40, 1, 1);

        let outcome = swarm.run().await;

        assert_eq!(outcome, SwarmOutcome { iterations: 1, aborted: 1 });
        assert_eq!(summary_count(&stats, "get_run"), (1, 1));
        assert_eq!(summary_count(&stats, AWAIT_REQUEST), (1, 1));
        assert_eq!(summary_count(&stats, "delete_run"), (0, 0));
        assert!(platform.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delete_is_recorded() {
        let platform = Arc::new(MemoryPlatform {
            final_state: Some(LifecycleState::Terminated),
            fail_delete: true,
            ..Default::default()
        });
        let (swarm, stats) = swarm_over(Arc::clone(&platform), 40, 1, 1);

        let outcome = swarm.run().await;

        assert_eq!(outcome.aborted, 0);
        assert_eq!(summary_count(&stats, "delete_run"), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_think_time_only_between_iterations() {
        struct Count(AtomicUsize);

        #[async_trait]
        impl UserScenario for Count {
            fn name(&self) -> &'static str {
                "count"
            }

            async fn run_once(&self, _user: usize) -> anyhow::Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let scenario = Arc::new(Count(AtomicUsize::new(0)));
        let swarm = Swarm::new(scenario.clone(), 1, 3)
            .with_wait(Duration::from_secs(2), Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        swarm.run().await;

        assert_eq!(scenario.0.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_think_time_range() {
        let min = Duration::from_secs(1);
        let max = Duration::from_secs(5);
        for _ in 0..100 {
            let pause = think_time(min, max);
            assert!(pause >= min && pause <= max);
        }
        assert_eq!(think_time(max, max), max);
    }
}
