//! Sweep, sleep, repeat.

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use sweepfile_core::{SweepConfig, SweepError};
use sweepfile_scan::{SweepReport, Sweeper};

/// Long-running loop that sweeps at a fixed interval.
///
/// Only one sweep is ever in flight. The sweep itself runs on a blocking
/// thread so the timer and the cancellation token stay responsive.
pub struct Scheduler {
    sweeper: Sweeper,
    interval: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler that sweeps every `frequency_days` days.
    pub fn new(config: SweepConfig) -> Self {
        let interval = config.interval();
        Self::with_sweeper(Sweeper::new(Arc::new(config)), interval)
    }

    /// Create a scheduler around an existing sweeper.
    pub fn with_sweeper(sweeper: Sweeper, interval: Duration) -> Self {
        Self {
            sweeper,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Pause between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Token that stops the scheduler when cancelled.
    ///
    /// Cancelling interrupts the wait between sweeps immediately and stops a
    /// running sweep before its next node.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled. Returns the number of sweeps started.
    pub async fn run(&self) -> u64 {
        tracing::info!(
            "Scheduler started (interval: {} days)",
            self.interval.as_secs() / (24 * 60 * 60)
        );

        let mut sweeps = 0;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            sweeps += 1;
            if let Err(SweepError::Cancelled) = self.log_sweep(self.run_once().await) {
                break;
            }

            if !self.wait().await {
                break;
            }
        }

        tracing::info!("Scheduler stopped after {} sweep(s)", sweeps);
        sweeps
    }

    /// Run at most `cycles` sweeps, waiting the interval between two of them.
    ///
    /// Stops early when cancelled. Every sweep result is returned, failed ones
    /// included.
    pub async fn run_cycles(&self, cycles: usize) -> Vec<Result<SweepReport, SweepError>> {
        let mut results = Vec::with_capacity(cycles);

        for cycle in 0..cycles {
            if cycle > 0 && !self.wait().await {
                break;
            }
            if self.cancel.is_cancelled() {
                break;
            }

            tracing::debug!("Starting sweep {}/{}", cycle + 1, cycles);
            let result = self.run_once().await;
            let stop = matches!(result, Err(SweepError::Cancelled));
            results.push(result);
            if stop {
                break;
            }
        }

        results
    }

    /// Run one sweep on the blocking pool.
    pub async fn run_once(&self) -> Result<SweepReport, SweepError> {
        let sweeper = self.sweeper.clone();
        let cancel = self.cancel.clone();

        tokio::task::spawn_blocking(move || sweeper.sweep_with_cancel(&cancel))
            .await
            .map_err(|e| SweepError::Task {
                message: e.to_string(),
            })?
    }

    fn log_sweep(
        &self,
        result: Result<SweepReport, SweepError>,
    ) -> Result<SweepReport, SweepError> {
        match &result {
            Ok(report) if report.failed > 0 => {
                tracing::warn!("Sweep completed with failures: {}", report.summary());
            }
            Ok(_) => {}
            Err(SweepError::Cancelled) => tracing::info!("Sweep cancelled"),
            Err(e) => tracing::error!("Error during sweep: {}", e),
        }
        result
    }

    /// Sleep for the interval. Returns `false` when cancelled first.
    async fn wait(&self) -> bool {
        tokio::select! {
            _ = sleep(self.interval) => true,
            _ = self.cancel.cancelled() => {
                tracing::warn!("Wait between sweeps interrupted, stopping");
                false
            }
        }
    }
}
