//! Z-score anomaly detection over metric streams
//!
//! Scores each incoming metric against the rolling baseline for its name
//! and emits a degradation forecast for values that deviate beyond the
//! configured threshold.

use super::baseline::Baseline;
use crate::models::{Metric, Prediction, PredictionStatus};
use chrono::Utc;
use std::collections::HashMap;
use tracing::info;

/// Default z-score threshold for flagging a value as anomalous
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 2.0;

/// How far ahead an emitted prediction is dated
const FORECAST_HORIZON_HOURS: i64 = 1;

/// Lifetime counters for one detector instance
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectorStats {
    /// Distinct metric names with a baseline
    pub baselines_tracked: usize,
    /// Metrics evaluated since construction
    pub metrics_evaluated: u64,
    /// Predictions emitted since construction
    pub predictions_emitted: u64,
}

/// Statistical anomaly detector with per-metric-name baselines
///
/// The detector holds no lock: `detect_anomalies` takes `&mut self`, so
/// exclusive ownership of the baseline map is enforced at compile time.
/// Concurrent pipelines run one detector per worker or wrap an instance in
/// a lock of their own.
#[derive(Debug)]
pub struct AnomalyDetector {
    threshold: f64,
    baselines: HashMap<String, Baseline>,
    metrics_evaluated: u64,
    predictions_emitted: u64,
}

impl AnomalyDetector {
    /// Create a detector flagging values more than `threshold` standard
    /// deviations away from their baseline mean
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            baselines: HashMap::new(),
            metrics_evaluated: 0,
            predictions_emitted: 0,
        }
    }

    /// Evaluate a batch of metrics in order, returning one prediction per
    /// anomalous value
    ///
    /// Non-anomalous metrics produce no output; the returned predictions
    /// preserve the arrival order of the values that triggered them.
    pub fn detect_anomalies(&mut self, metrics: &[Metric]) -> Vec<Prediction> {
        let mut predictions = Vec::new();

        for metric in metrics {
            if let Some(prediction) = self.evaluate(metric) {
                predictions.push(prediction);
            }
        }

        predictions
    }

    /// Read-only view of the baseline tracked for a metric name
    pub fn baseline(&self, metric_name: &str) -> Option<&Baseline> {
        self.baselines.get(metric_name)
    }

    /// Lifetime counters for this detector
    pub fn stats(&self) -> DetectorStats {
        DetectorStats {
            baselines_tracked: self.baselines.len(),
            metrics_evaluated: self.metrics_evaluated,
            predictions_emitted: self.predictions_emitted,
        }
    }

    /// Score one metric against its baseline
    ///
    /// The value feeds the baseline regardless of the verdict, so the
    /// baseline keeps adapting to whatever the stream actually does,
    /// anomalous points included.
    fn evaluate(&mut self, metric: &Metric) -> Option<Prediction> {
        self.metrics_evaluated += 1;

        let baseline = self
            .baselines
            .entry(metric.name.clone())
            .or_insert_with(Baseline::new);

        // Warm-up: too few lifetime samples to score, but the value still
        // contributes to the baseline
        if !baseline.has_sufficient_data() {
            baseline.record(metric.value);
            return None;
        }

        // Score against the baseline as it stood before this value
        let zscore = baseline.zscore(metric.value);
        baseline.record(metric.value);

        if zscore <= self.threshold {
            return None;
        }

        let probability = probability_from_zscore(zscore);
        self.predictions_emitted += 1;

        info!(
            metric = %metric.name,
            value = metric.value,
            zscore,
            probability,
            "Anomalous metric value detected"
        );

        Some(Prediction {
            timestamp: Utc::now() + chrono::Duration::hours(FORECAST_HORIZON_HOURS),
            status: PredictionStatus::Degraded,
            probability,
            reason: "Statistical anomaly detected".to_string(),
        })
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ZSCORE_THRESHOLD)
    }
}

/// Linear, saturating map from z-score to a [0, 1] severity score
fn probability_from_zscore(zscore: f64) -> f64 {
    (zscore / 10.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_metric(name: &str, value: f64) -> Metric {
        Metric::new(name, value, "ms")
    }

    fn create_test_batch(name: &str, values: &[f64]) -> Vec<Metric> {
        values.iter().map(|v| create_test_metric(name, *v)).collect()
    }

    #[test]
    fn test_warm_up_suppresses_predictions() {
        let mut detector = AnomalyDetector::default();

        // Wildly varying values, but too few lifetime samples to score
        let batch = create_test_batch(
            "cpu_usage_percent",
            &[1000.0, -500.0, 3.0, 77.7, 0.0, 250.0, -42.0, 18.0, 999.0],
        );
        assert!(detector.detect_anomalies(&batch).is_empty());

        // The tenth observation is still evaluated against nine samples
        let tenth = create_test_batch("cpu_usage_percent", &[5000.0]);
        assert!(detector.detect_anomalies(&tenth).is_empty());

        assert_eq!(detector.stats().predictions_emitted, 0);
    }

    #[test]
    fn test_detects_outlier_after_warm_up() {
        let mut detector = AnomalyDetector::default();

        let steady = create_test_batch("request_duration", &[50.0; 10]);
        assert!(detector.detect_anomalies(&steady).is_empty());

        // Identical window floors stddev at 1.0, so 55 sits 5 sigma out
        let predictions =
            detector.detect_anomalies(&[create_test_metric("request_duration", 55.0)]);

        assert_eq!(predictions.len(), 1);
        let prediction = &predictions[0];
        assert_eq!(prediction.status, PredictionStatus::Degraded);
        assert_eq!(prediction.probability, 0.5);
        assert_eq!(prediction.reason, "Statistical anomaly detected");
        // The timestamp is a forecast horizon, not the detection time
        assert!(prediction.timestamp - Utc::now() > chrono::Duration::minutes(59));
    }

    #[test]
    fn test_steady_values_are_not_flagged() {
        let mut detector = AnomalyDetector::default();

        // Warm up with a real spread so the stddev floor is not in play
        let mut warmup = Vec::new();
        for _ in 0..5 {
            warmup.push(create_test_metric("request_duration", 40.0));
            warmup.push(create_test_metric("request_duration", 60.0));
        }
        detector.detect_anomalies(&warmup);

        let predictions =
            detector.detect_anomalies(&create_test_batch("request_duration", &[50.0, 51.0, 49.5]));

        assert!(predictions.is_empty());
    }

    #[test]
    fn test_tight_baseline_flags_small_deviations() {
        let mut detector = AnomalyDetector::default();
        detector.detect_anomalies(&create_test_batch("request_duration", &[50.0; 10]));

        // Scored against the floored stddev of an identical window
        let steady =
            detector.detect_anomalies(&create_test_batch("request_duration", &[50.0, 51.0]));
        assert!(steady.is_empty());

        // Recording 51 gave the window real variance (stddev near 0.28), so
        // 49.5 now scores just above 2 sigma
        let predictions =
            detector.detect_anomalies(&[create_test_metric("request_duration", 49.5)]);

        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].status, PredictionStatus::Degraded);
        assert!(predictions[0].probability > 0.2 && predictions[0].probability < 0.25);
    }

    #[test]
    fn test_zscore_probability_mapping() {
        let mut detector = AnomalyDetector::default();

        // Alternating 40/60 leaves mean 50 and population stddev exactly 10
        let mut warmup = Vec::new();
        for _ in 0..5 {
            warmup.push(create_test_metric("request_duration", 40.0));
            warmup.push(create_test_metric("request_duration", 60.0));
        }
        assert!(detector.detect_anomalies(&warmup).is_empty());

        let baseline = detector.baseline("request_duration").unwrap();
        assert_eq!(baseline.mean, 50.0);
        assert_eq!(baseline.stddev, 10.0);

        // 80 is 3 sigma out, mapping to probability 0.3
        let predictions =
            detector.detect_anomalies(&[create_test_metric("request_duration", 80.0)]);
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].probability, 0.3);
    }

    #[test]
    fn test_probability_saturates_at_one() {
        assert_eq!(probability_from_zscore(3.0), 0.3);
        assert_eq!(probability_from_zscore(10.0), 1.0);
        assert_eq!(probability_from_zscore(95.0), 1.0);
    }

    #[test]
    fn test_output_preserves_anomalous_input_order() {
        let mut detector = AnomalyDetector::default();
        detector.detect_anomalies(&create_test_batch("request_duration", &[50.0; 10]));

        let batch = create_test_batch("request_duration", &[60.0, 50.0, 70.0]);
        let predictions = detector.detect_anomalies(&batch);

        // 60 (10 sigma against the floored baseline) and 70 flag; 50 does not
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].probability, 1.0);
        assert!(predictions[1].probability > 0.6);
    }

    #[test]
    fn test_baselines_are_independent_per_name() {
        let mut detector = AnomalyDetector::default();
        detector.detect_anomalies(&create_test_batch("cpu_usage_percent", &[50.0; 10]));

        let batch = vec![
            // First observation ever for this name: warm-up, never flagged
            create_test_metric("memory_usage_bytes", 9_999_999.0),
            create_test_metric("cpu_usage_percent", 60.0),
        ];
        let predictions = detector.detect_anomalies(&batch);

        assert_eq!(predictions.len(), 1);
        assert_eq!(detector.stats().baselines_tracked, 2);
    }

    #[test]
    fn test_sustained_shift_is_absorbed() {
        let mut detector = AnomalyDetector::default();
        detector.detect_anomalies(&create_test_batch("request_duration", &[50.0; 20]));

        // A level shift keeps flagging only until the window dilutes it
        let mut flagged = 0;
        let mut last_flagged_repeat = 0;
        for repeat in 1..=10 {
            let predictions =
                detector.detect_anomalies(&[create_test_metric("request_duration", 60.0)]);
            if !predictions.is_empty() {
                flagged += 1;
                last_flagged_repeat = repeat;
            }
        }

        assert_eq!(flagged, 5);
        assert_eq!(last_flagged_repeat, 5);
    }

    #[test]
    fn test_stats_counters() {
        let mut detector = AnomalyDetector::default();
        detector.detect_anomalies(&create_test_batch("request_duration", &[50.0; 10]));
        detector.detect_anomalies(&create_test_batch("request_duration", &[50.0, 75.0]));

        let stats = detector.stats();
        assert_eq!(stats.metrics_evaluated, 12);
        assert_eq!(stats.predictions_emitted, 1);
        assert_eq!(stats.baselines_tracked, 1);

        assert!(detector.baseline("request_duration").is_some());
        assert!(detector.baseline("unknown_metric").is_none());
    }
}
