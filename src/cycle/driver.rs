use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info};

use super::orchestrator::{CycleReport, Orchestrator};
use crate::config::OrchestratorConfig;

/// Runs cycles on a fixed interval until the shutdown flag flips to `true`.
///
/// The flag is polled every `poll_interval` while waiting between cycles.
/// A cycle that has started always runs to completion.
pub struct CycleDriver {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    poll_interval: Duration,
    max_cycles: Option<usize>,
}

impl CycleDriver {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Duration, poll_interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            max_cycles: None,
        }
    }

    pub fn from_config(orchestrator: Arc<Orchestrator>, config: &OrchestratorConfig) -> Self {
        Self::new(
            orchestrator,
            Duration::from_secs(config.interval_secs),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    /// Stop after `n` attempted cycles, failed ones included
    pub fn with_max_cycles(mut self, n: usize) -> Self {
        self.max_cycles = Some(n);
        self
    }

    /// Returns the number of cycles that completed successfully
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> usize {
        self.run_with(shutdown, |_| {}).await
    }

    /// Like [`run`](Self::run), handing each successful report to `on_report`
    pub async fn run_with<F>(&self, shutdown: watch::Receiver<bool>, mut on_report: F) -> usize
    where
        F: FnMut(&CycleReport),
    {
        let mut completed = 0usize;
        let mut attempted = 0usize;

        info!(
            interval_secs = self.interval.as_secs(),
            "Cycle driver started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            attempted += 1;
            match self.orchestrator.run_cycle().await {
                Ok(report) => {
                    completed += 1;
                    on_report(&report);
                }
                Err(e) => error!(cycle = attempted, error = %e, "Cycle failed"),
            }

            if self.max_cycles.map_or(false, |max| attempted >= max) {
                break;
            }

            if self.wait_or_shutdown(&shutdown).await {
                break;
            }
        }

        info!(completed, attempted, "Cycle driver stopped");
        completed
    }

    /// Sleep for one interval in `poll_interval` steps; true if shutdown was
    /// requested meanwhile
    async fn wait_or_shutdown(&self, shutdown: &watch::Receiver<bool>) -> bool {
        let deadline = Instant::now() + self.interval;

        loop {
            if *shutdown.borrow() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
