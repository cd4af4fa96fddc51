//! Health checks and monitoring
//!
//! This module aggregates component checks for the queue-desk service. It is
//! used by the `--health-check` flag and by the periodic refresh task that
//! keeps the health gauges current.

use crate::config::AppConfig;
use crate::queue::QueueManager;
use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Gauge value (0=unhealthy, 1=degraded, 2=healthy)
    pub fn as_metric(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }

    /// The worse of two statuses
    fn combine(self, other: HealthStatus) -> HealthStatus {
        if self.as_metric() <= other.as_metric() {
            self
        } else {
            other
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if not healthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub customers_waiting: usize,
    pub customers_in_service: usize,
    /// Entries still held in the store, any status
    pub total_entries: usize,
    pub counters: u32,
    pub total_customers_created: u64,
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: &AppState) -> Self {
        Self::assess(
            app_state.config(),
            &app_state.queue(),
            app_state.is_running().await,
            app_state.uptime(),
        )
    }

    /// Evaluate health from the individual service parts
    pub fn assess(
        config: &AppConfig,
        queue: &QueueManager,
        running: bool,
        uptime: Duration,
    ) -> Self {
        let checks = vec![
            Self::check_service_running(running),
            Self::check_queue_manager(queue),
            Self::check_snapshot_location(config.queue.snapshot_path.as_deref()),
        ];

        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |overall, check| {
                overall.combine(check.status)
            });

        let stats = match queue.stats() {
            Ok(queue_stats) => ServiceStats {
                customers_waiting: queue_stats.waiting,
                customers_in_service: queue_stats.in_service,
                total_entries: queue_stats.total_entries,
                counters: queue_stats.counters,
                total_customers_created: queue_stats.total_created,
                uptime_seconds: uptime.as_secs(),
            },
            Err(e) => {
                debug!("Failed to get queue stats for health check: {}", e);
                ServiceStats {
                    uptime_seconds: uptime.as_secs(),
                    ..ServiceStats::default()
                }
            }
        };

        HealthCheck {
            status,
            service: config.service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        }
    }

    /// A service that has not started yet can still answer, so it only
    /// degrades health
    fn check_service_running(running: bool) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = if running {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Degraded,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_queue_manager(queue: &QueueManager) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = match queue.stats() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Queue manager check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Cannot access queue state: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "queue_manager".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_snapshot_location(snapshot_path: Option<&Path>) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = match snapshot_path {
            None => (HealthStatus::Healthy, Some("Snapshots disabled".to_string())),
            Some(path) => {
                let parent = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                if parent.is_dir() {
                    (HealthStatus::Healthy, None)
                } else {
                    (
                        HealthStatus::Degraded,
                        Some(format!(
                            "Snapshot directory {} does not exist yet",
                            parent.display()
                        )),
                    )
                }
            }
        };

        ComponentCheck {
            name: "snapshot".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Convert health check to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
