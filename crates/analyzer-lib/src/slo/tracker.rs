//! SLO registry and status tracking
//!
//! Owns the declared SLOs, their bounded metric histories, and the status
//! snapshots recomputed on every update. All three tables sit behind a
//! single reader/writer lock: writers serialize, readers get copies.

use super::indicators;
use crate::models::{Metric, Slo, SloStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Newest raw samples retained per SLO
pub const MAX_SLO_SAMPLES: usize = 1000;

/// Point-in-time counters for one tracker instance
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerStats {
    /// Declared SLOs
    pub slos_tracked: usize,
    /// SLOs currently missing their target
    pub slos_violated: usize,
    /// Update calls applied to a known SLO
    pub updates_applied: u64,
    /// Update calls dropped for an unknown SLO name
    pub updates_ignored: u64,
}

/// Tables guarded by the tracker's lock
#[derive(Debug, Default)]
struct TrackerState {
    slos: HashMap<String, Slo>,
    status: HashMap<String, SloStatus>,
    metrics: HashMap<String, Vec<Metric>>,
}

/// Thread-safe SLO registry with synchronous status recomputation
///
/// Safe to share between metric producers and status readers: mutating
/// calls hold the exclusive lock for their full duration, reads take the
/// shared lock and return defensive copies.
#[derive(Debug, Default)]
pub struct SloTracker {
    state: RwLock<TrackerState>,
    updates_applied: AtomicU64,
    updates_ignored: AtomicU64,
}

impl SloTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an SLO, replacing any previous definition with the same
    /// name and resetting its status to the neutral state
    ///
    /// Accumulated metric history survives replacement and folds into the
    /// next recompute.
    pub fn add_slo(&self, slo: Slo) {
        let mut state = self.state.write().unwrap();

        let name = slo.name.clone();
        state
            .status
            .insert(name.clone(), SloStatus::neutral(slo.clone()));
        state.slos.insert(name.clone(), slo);

        info!(slo = %name, "SLO registered");
    }

    /// Append metrics to an SLO's history and synchronously recompute its
    /// status
    ///
    /// History is capped to the newest [`MAX_SLO_SAMPLES`] values, oldest
    /// dropped first. Updates for names never registered are dropped
    /// without error.
    pub fn update_metrics(&self, slo_name: &str, metrics: Vec<Metric>) {
        let mut state = self.state.write().unwrap();

        let slo = match state.slos.get(slo_name) {
            Some(slo) => slo.clone(),
            None => {
                self.updates_ignored.fetch_add(1, Ordering::Relaxed);
                debug!(slo = %slo_name, "Dropping metrics for unregistered SLO");
                return;
            }
        };

        let history = state.metrics.entry(slo_name.to_string()).or_default();
        history.extend(metrics);
        if history.len() > MAX_SLO_SAMPLES {
            let excess = history.len() - MAX_SLO_SAMPLES;
            history.drain(0..excess);
        }

        let status = calculate_status(&slo, history);
        let previous = state.status.insert(slo_name.to_string(), status.clone());
        self.updates_applied.fetch_add(1, Ordering::Relaxed);

        log_transitions(&slo, previous.as_ref(), &status);
    }

    /// Snapshot of one SLO's status
    pub fn get_slo_status(&self, slo_name: &str) -> Option<SloStatus> {
        self.state.read().unwrap().status.get(slo_name).cloned()
    }

    /// Defensive copy of the full status table
    pub fn get_all_slos(&self) -> HashMap<String, SloStatus> {
        self.state.read().unwrap().status.clone()
    }

    /// Point-in-time counters for this tracker
    pub fn stats(&self) -> TrackerStats {
        let state = self.state.read().unwrap();
        TrackerStats {
            slos_tracked: state.slos.len(),
            slos_violated: state.status.values().filter(|s| s.is_violated).count(),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_ignored: self.updates_ignored.load(Ordering::Relaxed),
        }
    }
}

/// Compute a status snapshot for `slo` over its full retained history
fn calculate_status(slo: &Slo, history: &[Metric]) -> SloStatus {
    let current_value = indicators::indicator_value(slo.sli, history);
    let error_budget = indicators::error_budget(current_value, slo.target);
    let burn_rate = indicators::burn_rate(history);
    let time_to_exhaust = indicators::time_to_exhaust(error_budget, burn_rate);

    SloStatus {
        slo: slo.clone(),
        current_value,
        error_budget,
        burn_rate,
        is_violated: current_value < slo.target,
        time_to_exhaust,
    }
}

/// Emit events for violation flips and newly crossed budget thresholds
fn log_transitions(slo: &Slo, previous: Option<&SloStatus>, current: &SloStatus) {
    let was_violated = previous.is_some_and(|p| p.is_violated);
    if current.is_violated && !was_violated {
        warn!(
            slo = %slo.name,
            current_value = current.current_value,
            target = slo.target,
            error_budget = current.error_budget,
            burn_rate = current.burn_rate,
            "SLO violated"
        );
    } else if !current.is_violated && was_violated {
        info!(
            slo = %slo.name,
            current_value = current.current_value,
            "SLO recovered"
        );
    }

    let previous_budget = previous.map_or(100.0, |p| p.error_budget);
    let crossed = indicators::newly_crossed_thresholds(
        &slo.budget_policy,
        previous_budget,
        current.error_budget,
    );
    for threshold in crossed {
        warn!(
            slo = %slo.name,
            error_budget = current.error_budget,
            threshold = threshold.threshold,
            action = %threshold.action,
            "Error budget fell below policy threshold"
        );
    }
}
