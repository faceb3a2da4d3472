//! Analyzer configuration

use anyhow::Result;
use serde::Deserialize;

/// Analyzer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Instance name, taken from the pod hostname when unset
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Status sampling interval in seconds
    #[serde(default = "default_status_refresh")]
    pub status_refresh_secs: u64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_status_refresh() -> u64 {
    30
}

impl AnalyzerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ANALYZER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| AnalyzerConfig {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            status_refresh_secs: default_status_refresh(),
        }))
    }
}
