//! Health Analyzer - cluster health monitoring service
//!
//! Hosts the SLO tracker and anomaly detection engines behind an
//! operational API for health probes and Prometheus scrapes.

use analyzer_lib::{
    health::{components, HealthRegistry},
    observability::{AnalyzerMetrics, StructuredLogger},
    sampler::{SamplerConfig, StatusSampler},
    slo::SloTracker,
};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const ANALYZER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting health-analyzer");

    // Load configuration
    let config = config::AnalyzerConfig::load()?;
    info!(instance = %config.instance_name, "Analyzer configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::ANOMALY_DETECTOR).await;
    health_registry.register(components::SLO_TRACKER).await;
    health_registry.register(components::STATUS_SAMPLER).await;

    // Initialize metrics and structured logger
    let metrics = AnalyzerMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(ANALYZER_VERSION);

    // Shared SLO tracker, fed by the embedding product's data path
    let tracker = Arc::new(SloTracker::new());

    // Start the status sampling loop
    let (shutdown_tx, _) = broadcast::channel(1);
    let sampler = StatusSampler::new(
        tracker.clone(),
        health_registry.clone(),
        metrics.clone(),
        SamplerConfig {
            interval: Duration::from_secs(config.status_refresh_secs),
        },
    );
    let sampler_handle = tokio::spawn(sampler.run(shutdown_tx.subscribe()));

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics.clone()));

    // Mark analyzer as ready after initialization
    health_registry.set_ready(true);

    // Start health and metrics server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    let _ = sampler_handle.await;
    info!("Shutting down");

    Ok(())
}
