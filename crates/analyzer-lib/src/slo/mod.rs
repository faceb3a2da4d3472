//! SLO tracking: SLI computation, error budgets, and burn rates

mod indicators;
mod tracker;

pub use indicators::{REQUEST_DURATION, REQUEST_ERRORS, REQUEST_SUCCESS, REQUEST_TOTAL};
pub use tracker::{SloTracker, TrackerStats, MAX_SLO_SAMPLES};
