//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the queue
//! manager, the HTTP server, snapshot persistence and background tasks.

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::http::{ApiState, HttpServer, HttpServerConfig};
use crate::queue::{load_snapshot, save_snapshot, QueueManager};
use crate::service::health::HealthCheck;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Snapshot error: {message}")]
    Snapshot { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// The queue aggregate
    queue: Arc<QueueManager>,

    /// HTTP API server
    http_server: Arc<HttpServer>,

    /// HTTP server task, drained on shutdown
    http_task: Mutex<Option<JoinHandle<()>>>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Initialize the application reading time from `clock`
    pub async fn with_clock(
        config: AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing {} queue service", config.service.name);
        info!(
            "Configuration: counters={}, http={}, snapshot={:?}",
            config.queue.counters,
            config.bind_address(),
            config.queue.snapshot_path
        );

        config
            .wait_time
            .validate()
            .map_err(|e| ServiceError::Configuration {
                message: e.to_string(),
            })?;

        let queue = Arc::new(
            QueueManager::with_clock(&config.queue, config.wait_time.clone(), clock).map_err(
                |e| ServiceError::Initialization {
                    message: format!("Failed to create queue manager: {}", e),
                },
            )?,
        );

        if let Some(path) = &config.queue.snapshot_path {
            let snapshot = load_snapshot(path).map_err(|e| ServiceError::Snapshot {
                message: format!("{:#}", e),
            })?;
            match snapshot {
                Some(snapshot) => {
                    queue.restore(snapshot).map_err(|e| ServiceError::Snapshot {
                        message: format!("Failed to restore snapshot: {}", e),
                    })?;
                }
                None => info!("No snapshot at {}, starting empty", path.display()),
            }
        }

        let http_server = Arc::new(HttpServer::new(
            HttpServerConfig {
                host: config.service.host.clone(),
                port: config.service.http_port,
            },
            ApiState::new(queue.clone(), config.service.name.clone()),
        ));

        Ok(Self {
            config,
            queue,
            http_server,
            http_task: Mutex::new(None),
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Start the HTTP server and background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        info!("Starting {} queue service", self.config.service.name);

        self.start_http_server().await?;

        // Mark as running once the API is listening
        *self.is_running.write().await = true;

        self.start_background_tasks().await?;

        info!("✅ Queue service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of queue service");

        // Mark as not running
        *self.is_running.write().await = false;

        self.stop_http_server().await;
        self.stop_background_tasks().await;

        if let Some(path) = &self.config.queue.snapshot_path {
            let snapshot = self
                .queue
                .snapshot()
                .map_err(|e| ServiceError::Snapshot {
                    message: format!("Failed to capture snapshot: {}", e),
                })?;
            save_snapshot(path, &snapshot).map_err(|e| ServiceError::Snapshot {
                message: format!("{:#}", e),
            })?;
        }

        let final_stats = self
            .queue
            .stats()
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Failed to get final stats: {}", e),
            })?;

        info!("Final queue statistics: {:?}", final_stats);
        info!("✅ Queue service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the queue manager
    pub fn queue(&self) -> Arc<QueueManager> {
        self.queue.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    async fn start_http_server(&self) -> Result<(), ServiceError> {
        info!("Starting HTTP API on {}", self.config.bind_address());

        let listener = self
            .http_server
            .bind()
            .await
            .map_err(|e| ServiceError::Initialization {
                message: format!("{:#}", e),
            })?;

        let http_server = self.http_server.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = http_server.serve(listener).await {
                error!("HTTP server failed: {:#}", e);
            } else {
                info!("HTTP server task completed");
            }
        });

        *self.http_task.lock().await = Some(handle);
        Ok(())
    }

    async fn start_background_tasks(&self) -> Result<(), ServiceError> {
        let refresh_interval = self.config.metrics_refresh_interval();
        info!(
            "Starting health metrics task ({}s interval)...",
            refresh_interval.as_secs()
        );

        let health_metrics_task = {
            let config = self.config.clone();
            let queue = self.queue.clone();
            let is_running = self.is_running.clone();
            let started_at = self.started_at;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(refresh_interval);
                let metrics_collector = queue.metrics();
                info!("Health metrics task started");

                while *is_running.read().await {
                    interval.tick().await;

                    let uptime = started_at.elapsed();
                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(uptime.as_secs() as i64);

                    let health = HealthCheck::assess(&config, &queue, true, uptime);
                    metrics_collector.update_health_status(health.status.as_metric());
                    for check in &health.checks {
                        metrics_collector.update_component_health(
                            &check.name,
                            check.status.as_metric() > 0,
                        );
                    }

                    // Gauges only; reconciliation stays with the mutations
                    metrics_collector.update_queue_gauges(
                        health.stats.customers_waiting,
                        health.stats.customers_in_service,
                        health.stats.counters,
                    );

                    debug!(
                        "Updated service health metrics - status: {}, uptime: {}s, waiting: {}",
                        health.status,
                        uptime.as_secs(),
                        health.stats.customers_waiting
                    );
                }

                info!("Health metrics task stopped");
            })
        };

        self.background_tasks.lock().await.push(health_metrics_task);
        info!("Background tasks started successfully");
        Ok(())
    }

    /// Let in-flight requests finish, up to the shutdown timeout
    async fn stop_http_server(&self) {
        self.http_server.stop();

        let Some(mut task) = self.http_task.lock().await.take() else {
            return;
        };
        let timeout = self.config.shutdown_timeout();
        if tokio::time::timeout(timeout, &mut task).await.is_err() {
            warn!(
                "HTTP server did not drain within {:?}, aborting",
                timeout
            );
            task.abort();
        }
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&self) {
        let tasks: Vec<JoinHandle<()>> = self.background_tasks.lock().await.drain(..).collect();
        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for (i, task) in tasks.into_iter().enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}
