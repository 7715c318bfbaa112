// ABOUTME: Fixed-interval trigger running one crawl batch per tick
// ABOUTME: A failed run is logged and the loop waits for the next tick
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::logging::CrawlLogger;
use crate::orchestrator::BatchOrchestrator;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Runs batches on a fixed interval
pub struct CrawlScheduler {
    orchestrator: BatchOrchestrator,
    period: Duration,
    execution_count: u64,
}

impl CrawlScheduler {
    /// Create a scheduler; the first batch runs immediately
    #[must_use]
    pub const fn new(orchestrator: BatchOrchestrator, period: Duration) -> Self {
        Self {
            orchestrator,
            period,
            execution_count: 0,
        }
    }

    /// Batches started so far
    #[must_use]
    pub const fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Run until `shutdown` resolves. Returns the number of batches started.
    ///
    /// A batch in progress when `shutdown` resolves is dropped.
    pub async fn run_until<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        info!(
            schedule.interval_secs = self.period.as_secs(),
            "Starting crawl scheduler"
        );
        tokio::pin!(shutdown);

        let mut timer = interval(self.period);
        // A run longer than the period delays the next one instead of bunching ticks
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = timer.tick() => {}
            }

            self.execution_count += 1;
            let cycle = self.execution_count;
            tokio::select! {
                () = &mut shutdown => break,
                result = self.orchestrator.run() => match result {
                    Ok(report) => info!(schedule.cycle = cycle, "Scheduled crawl finished: {report}"),
                    Err(e) => CrawlLogger::log_run_failure(&e),
                },
            }
        }

        info!(
            schedule.cycles = self.execution_count,
            "Crawl scheduler stopped"
        );
        self.execution_count
    }
}
