//! SLI calculators and budget arithmetic
//!
//! Pure functions the tracker runs over an SLO's retained metric history.
//! Producers feed the request-level indicators using the metric names
//! exported here.

use crate::models::{BudgetThreshold, Metric, SliKind};

/// Metric name carrying total request counts
pub const REQUEST_TOTAL: &str = "request_total";
/// Metric name carrying successful request counts
pub const REQUEST_SUCCESS: &str = "request_success";
/// Metric name carrying failed request counts
pub const REQUEST_ERRORS: &str = "request_errors";
/// Metric name carrying request latencies
pub const REQUEST_DURATION: &str = "request_duration";

/// Samples considered by the burn-rate differencing window
const BURN_RATE_WINDOW: usize = 10;

/// Exhaustion horizon beyond which no estimate is reported (one week)
const EXHAUST_REPORT_HORIZON_HOURS: f64 = 168.0;

/// Current indicator value for `kind` over the retained history
pub(crate) fn indicator_value(kind: SliKind, history: &[Metric]) -> f64 {
    match kind {
        SliKind::Availability => availability_percent(history),
        SliKind::Latency => latency_p95_estimate(history),
        SliKind::ErrorRate => error_free_percent(history),
        SliKind::Generic => mean_value(history),
    }
}

/// Successful requests as a percentage of total requests
///
/// Sums `request_success` against `request_total` values; 100 when no
/// requests have been seen.
fn availability_percent(history: &[Metric]) -> f64 {
    let mut success = 0.0;
    let mut total = 0.0;

    for metric in history {
        match metric.name.as_str() {
            REQUEST_SUCCESS => success += metric.value,
            REQUEST_TOTAL => total += metric.value,
            _ => {}
        }
    }

    if total == 0.0 {
        return 100.0;
    }
    success / total * 100.0
}

/// Approximate 95th percentile of `request_duration` samples
///
/// Picks index round(0.95 * (N-1)) in the retained arrival order, without
/// sorting; 0 when no samples exist. A rank estimator, not a true order
/// statistic.
fn latency_p95_estimate(history: &[Metric]) -> f64 {
    let durations: Vec<f64> = history
        .iter()
        .filter(|m| m.name == REQUEST_DURATION)
        .map(|m| m.value)
        .collect();

    if durations.is_empty() {
        return 0.0;
    }

    let index = (0.95 * (durations.len() - 1) as f64).round() as usize;
    durations[index.min(durations.len() - 1)]
}

/// Success-rate complement of the error percentage
///
/// `100 - errors / total * 100` over `request_errors` and `request_total`;
/// 100 when no requests have been seen.
fn error_free_percent(history: &[Metric]) -> f64 {
    let mut errors = 0.0;
    let mut total = 0.0;

    for metric in history {
        match metric.name.as_str() {
            REQUEST_ERRORS => errors += metric.value,
            REQUEST_TOTAL => total += metric.value,
            _ => {}
        }
    }

    if total == 0.0 {
        return 100.0;
    }
    100.0 - (errors / total * 100.0)
}

/// Arithmetic mean of all retained sample values; 0 when empty
fn mean_value(history: &[Metric]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let sum: f64 = history.iter().map(|m| m.value).sum();
    sum / history.len() as f64
}

/// Remaining error budget for an indicator value against its target
///
/// A deficit is amplified tenfold and clamped at 0; meeting the target
/// leaves the budget full.
pub(crate) fn error_budget(current_value: f64, target: f64) -> f64 {
    if current_value < target {
        (100.0 - (target - current_value) * 10.0).max(0.0)
    } else {
        100.0
    }
}

/// Heuristic budget consumption rate over the most recent samples
///
/// Sums the successive decreases (`max(0, prev - curr)`) across the last
/// [`BURN_RATE_WINDOW`] raw sample values and divides by the step count;
/// flat or increasing runs yield 0. Dimensionless.
pub(crate) fn burn_rate(history: &[Metric]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let start = history.len().saturating_sub(BURN_RATE_WINDOW);
    let recent = &history[start..];

    let mut total_decrease = 0.0;
    for pair in recent.windows(2) {
        let decrease = pair[0].value - pair[1].value;
        if decrease > 0.0 {
            total_decrease += decrease;
        }
    }

    total_decrease / (recent.len() - 1) as f64
}

/// Hours until the budget runs out at the current burn rate
///
/// Formatted as fixed-point hours; unset when the burn rate is zero or the
/// estimate is over a week out.
pub(crate) fn time_to_exhaust(error_budget: f64, burn_rate: f64) -> Option<String> {
    if burn_rate <= 0.0 {
        return None;
    }

    let hours_left = error_budget / burn_rate;
    if hours_left < EXHAUST_REPORT_HORIZON_HOURS {
        Some(format!("{hours_left:.1}h"))
    } else {
        None
    }
}

/// Policy thresholds the budget newly fell below in this recompute
pub(crate) fn newly_crossed_thresholds<'a>(
    policy: &'a [BudgetThreshold],
    previous_budget: f64,
    current_budget: f64,
) -> Vec<&'a BudgetThreshold> {
    policy
        .iter()
        .filter(|t| current_budget < t.threshold && previous_budget >= t.threshold)
        .collect()
}
