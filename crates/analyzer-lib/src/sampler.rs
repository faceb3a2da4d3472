//! Periodic status sampling loop
//!
//! Folds tracker state into the health registry and Prometheus gauges at
//! a fixed interval so probes and scrapes see fresh numbers without
//! touching the tracker's lock on every request.

use crate::health::{components, HealthRegistry};
use crate::observability::AnalyzerMetrics;
use crate::slo::{SloTracker, TrackerStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::{debug, info};

/// Configuration for the status sampling loop
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Sampling interval (default: 30 seconds)
    pub interval: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Status sampling loop over a shared SLO tracker
pub struct StatusSampler {
    tracker: Arc<SloTracker>,
    health: HealthRegistry,
    metrics: AnalyzerMetrics,
    config: SamplerConfig,
}

impl StatusSampler {
    pub fn new(
        tracker: Arc<SloTracker>,
        health: HealthRegistry,
        metrics: AnalyzerMetrics,
        config: SamplerConfig,
    ) -> Self {
        Self {
            tracker,
            health,
            metrics,
            config,
        }
    }

    /// Start the sampling loop
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting status sampling loop"
        );

        let mut ticker = interval(self.config.interval);
        let mut cycle_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.refresh_once().await;
                    cycle_count += 1;

                    // Every 5 minutes at the 30s default
                    if cycle_count % 10 == 0 {
                        debug!(
                            slos = stats.slos_tracked,
                            violated = stats.slos_violated,
                            "Status sampling cycle complete"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down status sampling loop");
                    break;
                }
            }
        }
    }

    /// Run one sampling pass and return the tracker snapshot it saw
    pub async fn refresh_once(&self) -> TrackerStats {
        let start = Instant::now();
        let stats = self.tracker.stats();

        self.metrics
            .set_slo_counts(stats.slos_tracked as i64, stats.slos_violated as i64);
        self.metrics
            .set_update_counts(stats.updates_applied as i64, stats.updates_ignored as i64);

        if stats.slos_violated > 0 {
            self.health
                .set_degraded(
                    components::SLO_TRACKER,
                    format!(
                        "{} of {} SLOs violated",
                        stats.slos_violated, stats.slos_tracked
                    ),
                )
                .await;
        } else {
            self.health.set_healthy(components::SLO_TRACKER).await;
        }

        // Heartbeat so a stalled loop shows up as a stale timestamp
        self.health.set_healthy(components::STATUS_SAMPLER).await;

        self.metrics
            .observe_status_refresh(start.elapsed().as_secs_f64());

        stats
    }
}
