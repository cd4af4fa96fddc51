//! Test fixtures shared by the integration test suites
#![allow(dead_code)]

use chrono::{Local, TimeZone};
use queue_desk::config::QueueSettings;
use queue_desk::types::{CustomerId, CustomerType, JoinRequest, Timestamp};
use queue_desk::wait_time::WaitTimeConfig;
use queue_desk::{ManualClock, QueueManager};
use std::sync::Arc;

/// Local time on a fixed weekday
pub fn at(hour: u32, minute: u32) -> Timestamp {
    Local
        .with_ymd_and_hms(2024, 3, 4, hour, minute, 0)
        .single()
        .expect("fixture time must be unambiguous")
}

/// An hour outside every rush window
pub fn off_peak() -> Timestamp {
    at(7, 0)
}

/// Queue manager driven by a manual clock
pub struct TestQueue {
    pub manager: Arc<QueueManager>,
    pub clock: Arc<ManualClock>,
}

impl TestQueue {
    /// Default estimator and catalog with the given counter count
    pub fn new(counters: u32, start: Timestamp) -> Self {
        Self::with_config(counters, start, WaitTimeConfig::default())
    }

    /// Estimator without time-of-day scaling, for properties that must hold
    /// at any hour
    pub fn flat(counters: u32) -> Self {
        Self::with_config(counters, off_peak(), WaitTimeConfig::without_rush_hours())
    }

    pub fn with_config(counters: u32, start: Timestamp, wait_time: WaitTimeConfig) -> Self {
        let clock = Arc::new(ManualClock::new(start));
        let settings = QueueSettings {
            counters,
            ..QueueSettings::default()
        };
        let manager = QueueManager::with_clock(&settings, wait_time, clock.clone())
            .expect("failed to build queue manager");

        Self {
            manager: Arc::new(manager),
            clock,
        }
    }

    /// Join `count` walk-ins for the general service, one minute apart
    pub fn join_walk_ins(&self, count: usize) -> Vec<CustomerId> {
        (0..count)
            .map(|i| {
                let entry = self
                    .manager
                    .join(JoinRequest::new(format!("customer-{}", i)))
                    .expect("join failed");
                self.clock.advance_minutes(1);
                entry.id
            })
            .collect()
    }

    pub fn join_as(&self, name: &str, customer_type: CustomerType) -> CustomerId {
        self.manager
            .join(JoinRequest::new(name).with_customer_type(customer_type))
            .expect("join failed")
            .id
    }
}
