//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the queue service using
//! Prometheus metrics.

use crate::types::{CustomerType, QueueStatus};
use anyhow::Result;
use prometheus::{
    GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the queue service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue population and lifecycle metrics
    queue_metrics: QueueMetrics,

    /// Estimated and observed timing metrics
    wait_time_metrics: WaitTimeMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Queue population and lifecycle metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Customers who joined, by customer type
    pub customers_joined_total: IntCounterVec,

    /// Status changes, by old and new status
    pub status_transitions_total: IntCounterVec,

    /// Entries deleted from the queue
    pub customers_removed_total: IntCounter,

    /// Customers currently waiting
    pub customers_waiting: IntGauge,

    /// Customers currently being served
    pub customers_in_service: IntGauge,

    /// Configured service counters
    pub counters_configured: IntGauge,

    /// Current baseline per service type
    pub baseline_minutes: GaugeVec,
}

/// Estimated and observed timing metrics
#[derive(Clone)]
pub struct WaitTimeMetrics {
    /// Wait estimate handed out at join time
    pub estimated_wait_minutes: Histogram,

    /// Observed wait between check-in and service start
    pub actual_wait_minutes: Histogram,

    /// Observed service duration
    pub actual_service_minutes: Histogram,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Reconciliation pass duration
    pub reconciliation_duration: Histogram,

    /// Queue operation durations
    pub queue_operation_duration: HistogramVec,
}

const MINUTE_BUCKETS: [f64; 10] = [0.0, 5.0, 10.0, 15.0, 20.0, 30.0, 45.0, 60.0, 90.0, 120.0];

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let wait_time_metrics = WaitTimeMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            wait_time_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Get wait time metrics
    pub fn wait_time(&self) -> &WaitTimeMetrics {
        &self.wait_time_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a customer joining along with the estimate they were given
    pub fn record_join(&self, customer_type: CustomerType, estimated_wait_minutes: i64) {
        self.queue_metrics
            .customers_joined_total
            .with_label_values(&[customer_type.as_str()])
            .inc();

        self.wait_time_metrics
            .estimated_wait_minutes
            .observe(estimated_wait_minutes as f64);
    }

    /// Record a status change
    pub fn record_status_change(&self, from: QueueStatus, to: QueueStatus) {
        self.queue_metrics
            .status_transitions_total
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    pub fn record_actual_wait(&self, minutes: i64) {
        self.wait_time_metrics
            .actual_wait_minutes
            .observe(minutes as f64);
    }

    pub fn record_actual_service(&self, minutes: i64) {
        self.wait_time_metrics
            .actual_service_minutes
            .observe(minutes as f64);
    }

    pub fn record_removal(&self) {
        self.queue_metrics.customers_removed_total.inc();
    }

    /// Refresh population gauges after a reconciliation
    pub fn update_queue_gauges(&self, waiting: usize, in_service: usize, counters: u32) {
        self.queue_metrics.customers_waiting.set(waiting as i64);
        self.queue_metrics.customers_in_service.set(in_service as i64);
        self.queue_metrics
            .counters_configured
            .set(i64::from(counters));
    }

    pub fn record_baseline(&self, service_type: &str, minutes: f64) {
        self.queue_metrics
            .baseline_minutes
            .with_label_values(&[service_type])
            .set(minutes);
    }

    pub fn record_reconciliation(&self, duration: Duration) {
        self.performance_metrics
            .reconciliation_duration
            .observe(duration.as_secs_f64());
    }

    /// Record queue operation duration
    pub fn record_queue_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .queue_operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("queue_desk_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "queue_desk_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("queue_desk_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let customers_joined_total = IntCounterVec::new(
            Opts::new("queue_desk_customers_joined_total", "Customers who joined the queue"),
            &["customer_type"],
        )?;
        registry.register(Box::new(customers_joined_total.clone()))?;

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "queue_desk_status_transitions_total",
                "Queue entry status changes",
            ),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions_total.clone()))?;

        let customers_removed_total = IntCounter::new(
            "queue_desk_customers_removed_total",
            "Entries removed from the queue",
        )?;
        registry.register(Box::new(customers_removed_total.clone()))?;

        let customers_waiting =
            IntGauge::new("queue_desk_customers_waiting", "Customers currently waiting")?;
        registry.register(Box::new(customers_waiting.clone()))?;

        let customers_in_service = IntGauge::new(
            "queue_desk_customers_in_service",
            "Customers currently being served",
        )?;
        registry.register(Box::new(customers_in_service.clone()))?;

        let counters_configured = IntGauge::new(
            "queue_desk_counters_configured",
            "Configured service counters",
        )?;
        registry.register(Box::new(counters_configured.clone()))?;

        let baseline_minutes = GaugeVec::new(
            Opts::new(
                "queue_desk_baseline_minutes",
                "Baseline service duration per service type",
            ),
            &["service_type"],
        )?;
        registry.register(Box::new(baseline_minutes.clone()))?;

        Ok(Self {
            customers_joined_total,
            status_transitions_total,
            customers_removed_total,
            customers_waiting,
            customers_in_service,
            counters_configured,
            baseline_minutes,
        })
    }
}

impl WaitTimeMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let estimated_wait_minutes = Histogram::with_opts(
            HistogramOpts::new(
                "queue_desk_estimated_wait_minutes",
                "Wait estimate given at check-in",
            )
            .buckets(MINUTE_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(estimated_wait_minutes.clone()))?;

        let actual_wait_minutes = Histogram::with_opts(
            HistogramOpts::new(
                "queue_desk_actual_wait_minutes",
                "Observed wait between check-in and service start",
            )
            .buckets(MINUTE_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(actual_wait_minutes.clone()))?;

        let actual_service_minutes = Histogram::with_opts(
            HistogramOpts::new(
                "queue_desk_actual_service_minutes",
                "Observed service duration",
            )
            .buckets(MINUTE_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(actual_service_minutes.clone()))?;

        Ok(Self {
            estimated_wait_minutes,
            actual_wait_minutes,
            actual_service_minutes,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let reconciliation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "queue_desk_reconciliation_duration_seconds",
                "Queue reconciliation time",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(reconciliation_duration.clone()))?;

        let queue_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "queue_desk_queue_operation_duration_seconds",
                "Queue operation duration",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["operation"],
        )?;
        registry.register(Box::new(queue_operation_duration.clone()))?;

        Ok(Self {
            reconciliation_duration,
            queue_operation_duration,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        // Test that we can access all metric groups
        let _service = collector.service();
        let _queue = collector.queue();
        let _wait_time = collector.wait_time();
        let _performance = collector.performance();
    }

    #[test]
    fn test_queue_lifecycle_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_join(CustomerType::Vip, 12);
        collector.record_join(CustomerType::WalkIn, 30);
        collector.record_status_change(QueueStatus::Waiting, QueueStatus::InService);
        collector.record_actual_wait(7);
        collector.record_actual_service(14);
        collector.record_removal();

        assert_eq!(
            collector
                .queue()
                .customers_joined_total
                .with_label_values(&["vip"])
                .get(),
            1
        );
        assert_eq!(
            collector
                .queue()
                .status_transitions_total
                .with_label_values(&["waiting", "in_service"])
                .get(),
            1
        );
        assert_eq!(collector.queue().customers_removed_total.get(), 1);
        assert_eq!(
            collector.wait_time().estimated_wait_minutes.get_sample_count(),
            2
        );
    }

    #[test]
    fn test_gauges_follow_latest_values() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_queue_gauges(4, 2, 3);
        collector.update_queue_gauges(3, 3, 3);
        collector.record_baseline("general", 17.5);

        assert_eq!(collector.queue().customers_waiting.get(), 3);
        assert_eq!(collector.queue().customers_in_service.get(), 3);
        assert_eq!(collector.queue().counters_configured.get(), 3);
        assert_eq!(
            collector
                .queue()
                .baseline_minutes
                .with_label_values(&["general"])
                .get(),
            17.5
        );
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2); // Healthy
        collector.update_component_health("queue_manager", true);
        collector.update_component_health("http", false);
        assert_eq!(collector.service().health_status.get(), 2);
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
        collector.record_queue_operation("join", final_duration);
        collector.record_reconciliation(Duration::from_micros(50));
    }
}
