//! Observability infrastructure for the health analyzer
//!
//! Provides:
//! - Prometheus metrics (SLO counts, update counters, refresh latency)
//! - Structured JSON logging with tracing

use prometheus::{register_histogram, register_int_gauge, Histogram, IntGauge};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::{Prediction, PredictionStatus, SloStatus};

/// Histogram buckets for status refresh latency (in seconds)
const REFRESH_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AnalyzerMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct AnalyzerMetricsInner {
    slos_tracked: IntGauge,
    slos_violated: IntGauge,
    slo_updates: IntGauge,
    slo_updates_ignored: IntGauge,
    status_refresh_seconds: Histogram,
}

impl AnalyzerMetricsInner {
    fn new() -> Self {
        Self {
            slos_tracked: register_int_gauge!(
                "health_analyzer_slos_tracked",
                "Number of SLOs currently registered with the tracker"
            )
            .expect("Failed to register slos_tracked"),

            slos_violated: register_int_gauge!(
                "health_analyzer_slos_violated",
                "Number of registered SLOs currently in violation"
            )
            .expect("Failed to register slos_violated"),

            slo_updates: register_int_gauge!(
                "health_analyzer_slo_updates_total",
                "Total number of metric batches applied to SLOs"
            )
            .expect("Failed to register slo_updates"),

            slo_updates_ignored: register_int_gauge!(
                "health_analyzer_slo_updates_ignored_total",
                "Total number of metric batches dropped for unknown SLO names"
            )
            .expect("Failed to register slo_updates_ignored"),

            status_refresh_seconds: register_histogram!(
                "health_analyzer_status_refresh_duration_seconds",
                "Time spent sampling tracker state into health and metrics",
                REFRESH_BUCKETS.to_vec()
            )
            .expect("Failed to register status_refresh_seconds"),
        }
    }
}

/// Analyzer metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AnalyzerMetrics {
    // This is just a marker - we use the global instance
    _private: (),
}

impl Default for AnalyzerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AnalyzerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AnalyzerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Update SLO population gauges
    pub fn set_slo_counts(&self, tracked: i64, violated: i64) {
        self.inner().slos_tracked.set(tracked);
        self.inner().slos_violated.set(violated);
    }

    /// Update metric batch counters from a tracker snapshot
    pub fn set_update_counts(&self, applied: i64, ignored: i64) {
        self.inner().slo_updates.set(applied);
        self.inner().slo_updates_ignored.set(ignored);
    }

    /// Record a status refresh latency observation
    pub fn observe_status_refresh(&self, duration_secs: f64) {
        self.inner().status_refresh_seconds.observe(duration_secs);
    }
}

/// Structured logger for analyzer events
///
/// Provides consistent JSON-formatted logging for anomalies, SLO
/// violations, and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log analyzer startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "analyzer_started",
            instance = %self.instance,
            analyzer_version = %version,
            "Health analyzer started"
        );
    }

    /// Log analyzer shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "analyzer_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Health analyzer shutting down"
        );
    }

    /// Log an anomaly prediction for a metric
    pub fn log_anomaly(&self, metric_name: &str, prediction: &Prediction) {
        match prediction.status {
            PredictionStatus::Critical => {
                warn!(
                    event = "anomaly_detected",
                    instance = %self.instance,
                    metric = %metric_name,
                    status = %prediction.status,
                    probability = prediction.probability,
                    reason = %prediction.reason,
                    "Critical anomaly detected"
                );
            }
            _ => {
                info!(
                    event = "anomaly_detected",
                    instance = %self.instance,
                    metric = %metric_name,
                    status = %prediction.status,
                    probability = prediction.probability,
                    reason = %prediction.reason,
                    "Anomaly detected"
                );
            }
        }
    }

    /// Log an SLO violation with exhaustion outlook
    pub fn log_slo_violation(&self, status: &SloStatus) {
        warn!(
            event = "slo_violated",
            instance = %self.instance,
            slo = %status.slo.name,
            sli = %status.slo.sli,
            current_value = status.current_value,
            target = status.slo.target,
            error_budget = status.error_budget,
            burn_rate = status.burn_rate,
            time_to_exhaust = ?status.time_to_exhaust,
            "SLO violated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PredictionStatus, SliKind, Slo, SloStatus};
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_analyzer_metrics_creation() {
        // Note: This test may fail if run multiple times in the same process
        // due to Prometheus global registry. In practice, metrics are created once.
        let metrics = AnalyzerMetrics::new();

        metrics.set_slo_counts(3, 1);
        metrics.set_update_counts(42, 2);
        metrics.observe_status_refresh(0.001);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("analyzer-1");
        assert_eq!(logger.instance, "analyzer-1");
    }

    #[test]
    fn test_logging_does_not_panic() {
        let logger = StructuredLogger::new("analyzer-1");

        logger.log_startup("0.1.0");
        logger.log_anomaly(
            "cpu_usage",
            &Prediction {
                timestamp: Utc::now(),
                status: PredictionStatus::Degraded,
                probability: 0.4,
                reason: "Statistical anomaly detected".to_string(),
            },
        );

        let slo = Slo {
            name: "api-availability".to_string(),
            description: "Availability of the API".to_string(),
            sli: SliKind::Availability,
            target: 99.9,
            window: Duration::from_secs(86400),
            budget_policy: Vec::new(),
        };
        let mut status = SloStatus::neutral(slo);
        status.current_value = 98.0;
        status.is_violated = true;
        logger.log_slo_violation(&status);

        logger.log_shutdown("test complete");
    }
}
