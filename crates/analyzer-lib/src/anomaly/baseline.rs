//! Rolling baseline statistics for anomaly scoring
//!
//! Each metric name gets its own [`Baseline`]: a bounded window of recent
//! observations together with the running mean and standard deviation the
//! detector scores new values against.

use std::collections::VecDeque;

/// Number of recent observations a baseline retains
pub const BASELINE_WINDOW_SIZE: usize = 100;

/// Lifetime observations required before anomaly scoring activates
pub const MIN_SAMPLES_FOR_DETECTION: u64 = 10;

/// Standard deviation floor applied when the window has zero variance
const ZERO_VARIANCE_FLOOR: f64 = 1.0;

/// Online (mean, stddev) estimate of a metric's normal range
///
/// The window holds at most [`BASELINE_WINDOW_SIZE`] values with the oldest
/// evicted first; `count` keeps growing past the window, so warm-up is
/// judged on lifetime observations rather than retained ones.
#[derive(Debug, Clone)]
pub struct Baseline {
    /// Arithmetic mean of the current window
    pub mean: f64,
    /// Population standard deviation of the current window, never zero
    pub stddev: f64,
    /// Total observations ever recorded
    pub count: u64,
    /// Retained observations in arrival order
    window: VecDeque<f64>,
}

impl Baseline {
    pub fn new() -> Self {
        Self {
            mean: 0.0,
            stddev: 1.0,
            count: 0,
            window: VecDeque::with_capacity(BASELINE_WINDOW_SIZE),
        }
    }

    /// Fold one observation into the window and refresh the statistics
    pub fn record(&mut self, value: f64) {
        self.window.push_back(value);
        if self.window.len() > BASELINE_WINDOW_SIZE {
            self.window.pop_front();
        }
        self.count += 1;
        self.recalculate();
    }

    /// Absolute distance of `value` from the mean, in standard deviations
    pub fn zscore(&self, value: f64) -> f64 {
        (value - self.mean).abs() / self.stddev
    }

    /// Whether enough observations exist for scoring to be meaningful
    pub fn has_sufficient_data(&self) -> bool {
        self.count >= MIN_SAMPLES_FOR_DETECTION
    }

    /// Number of observations currently retained
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    fn recalculate(&mut self) {
        let n = self.window.len() as f64;
        self.mean = self.window.iter().sum::<f64>() / n;

        // Population variance: divide by N, not N - 1
        let variance = self
            .window
            .iter()
            .map(|v| (v - self.mean).powi(2))
            .sum::<f64>()
            / n;
        self.stddev = variance.sqrt();

        // An all-identical window must not leave zscore dividing by zero
        if self.stddev == 0.0 {
            self.stddev = ZERO_VARIANCE_FLOOR;
        }
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self::new()
    }
}
