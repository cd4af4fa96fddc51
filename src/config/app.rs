//! Main application configuration
//!
//! This module defines the configuration structures for the queue-desk
//! service, including TOML file and environment variable loading and
//! validation.

use crate::wait_time::catalog::default_baselines;
use crate::wait_time::{WaitTimeConfig, DEFAULT_BASELINE_MINUTES};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub queue: QueueSettings,
    pub wait_time: WaitTimeConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP API binds to
    pub host: String,
    /// Port for the HTTP API
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Interval between health and gauge refreshes
    pub metrics_refresh_seconds: u64,
}

/// Queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Number of open service counters
    pub counters: u32,
    /// Service type used when a join request leaves it blank
    pub default_service_type: String,
    /// Baseline for service types missing from `baselines`
    pub default_baseline_minutes: f64,
    /// Initial baseline per service type, in minutes
    pub baselines: BTreeMap<String, f64>,
    /// Where to keep the queue snapshot between restarts
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "queue-desk".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8000,
            shutdown_timeout_seconds: 30,
            metrics_refresh_seconds: 30,
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            counters: 3,
            default_service_type: "general".to_string(),
            default_baseline_minutes: DEFAULT_BASELINE_MINUTES,
            baselines: default_baselines(),
            snapshot_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.queue.counters = config.queue.counters.max(1);

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing sections use defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.queue.counters = config.queue.counters.max(1);

        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Queue settings
        if let Ok(counters) = env::var("QUEUE_COUNTERS") {
            let requested: i64 = counters
                .parse()
                .map_err(|_| anyhow!("Invalid QUEUE_COUNTERS value: {}", counters))?;
            self.queue.counters = clamp_counters(requested);
        }
        if let Ok(service_type) = env::var("DEFAULT_SERVICE_TYPE") {
            self.queue.default_service_type = service_type;
        }
        if let Ok(baseline) = env::var("DEFAULT_BASELINE_MINUTES") {
            self.queue.default_baseline_minutes = baseline
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_BASELINE_MINUTES value: {}", baseline))?;
        }
        if let Ok(path) = env::var("QUEUE_SNAPSHOT_PATH") {
            self.queue.snapshot_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get health and gauge refresh interval as Duration
    pub fn metrics_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.service.metrics_refresh_seconds)
    }

    /// Address string the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.http_port)
    }
}

/// Clamp a requested counter count to the supported range
pub fn clamp_counters(requested: i64) -> u32 {
    requested.clamp(1, i64::from(u32::MAX)) as u32
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.service.metrics_refresh_seconds == 0 {
        return Err(anyhow!("Metrics refresh interval must be greater than 0"));
    }

    // Validate queue settings
    if config.queue.default_service_type.trim().is_empty() {
        return Err(anyhow!("Default service type cannot be empty"));
    }
    if !config.queue.default_baseline_minutes.is_finite()
        || config.queue.default_baseline_minutes <= 0.0
    {
        return Err(anyhow!("Default baseline must be positive"));
    }
    for (service_type, minutes) in &config.queue.baselines {
        if !minutes.is_finite() || *minutes <= 0.0 {
            return Err(anyhow!(
                "Baseline for '{}' must be positive, got {}",
                service_type,
                minutes
            ));
        }
    }

    config.wait_time.validate()?;

    Ok(())
}
