//! Metrics and monitoring for the queue service
//!
//! This module provides Prometheus metrics collection for queue activity,
//! estimate quality and service health.

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, PerformanceMetrics, QueueMetrics, ServiceMetrics,
    WaitTimeMetrics,
};
