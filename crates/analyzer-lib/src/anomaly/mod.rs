//! Anomaly detection engine
//!
//! Maintains a rolling statistical baseline per metric name and flags
//! values that deviate beyond a configurable z-score threshold, emitting
//! degradation forecasts for the API layer to serve.

mod baseline;
mod detector;

pub use baseline::{Baseline, BASELINE_WINDOW_SIZE, MIN_SAMPLES_FOR_DETECTION};
pub use detector::{AnomalyDetector, DetectorStats, DEFAULT_ZSCORE_THRESHOLD};
