//! Analyzer library for cluster health monitoring
//!
//! This crate provides the core functionality for:
//! - Statistical anomaly detection over metric streams
//! - SLO tracking with error budgets and burn rates
//! - Periodic status sampling
//! - Health checks and observability

pub mod anomaly;
pub mod health;
pub mod models;
pub mod observability;
pub mod sampler;
pub mod slo;

pub use anomaly::{AnomalyDetector, Baseline, DetectorStats};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AnalyzerMetrics, StructuredLogger};
pub use sampler::{SamplerConfig, StatusSampler};
pub use slo::{SloTracker, TrackerStats};
