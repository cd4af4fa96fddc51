//! Common types used throughout the queue service

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a queue entry
pub type CustomerId = Uuid;

/// Wall-clock instant used for check-in and service timestamps
pub type Timestamp = DateTime<Local>;

/// Kind of customer, used for priority adjustments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    WalkIn,
    Appointment,
    Vip,
    Returning,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::WalkIn => "walk_in",
            CustomerType::Appointment => "appointment",
            CustomerType::Vip => "vip",
            CustomerType::Returning => "returning",
        }
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    InService,
    Completed,
    NoShow,
    Cancelled,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::InService => "in_service",
            QueueStatus::Completed => "completed",
            QueueStatus::NoShow => "no_show",
            QueueStatus::Cancelled => "cancelled",
        }
    }

    /// Completed, no-show and cancelled entries never re-enter service on their own
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueStatus::Completed | QueueStatus::NoShow | QueueStatus::Cancelled
        )
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One customer's lifecycle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: CustomerId,
    pub customer_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub customer_type: CustomerType,
    pub service_type: String,
    pub status: QueueStatus,
    /// 1-based rank among waiting entries; stale once the entry leaves `Waiting`
    pub position: usize,
    pub estimated_wait_time: i64,
    pub estimated_turnaround_time: i64,
    pub actual_wait_time: Option<i64>,
    pub actual_service_time: Option<i64>,
    pub check_in_time: Timestamp,
    pub service_start_time: Option<Timestamp>,
    pub service_end_time: Option<Timestamp>,
    pub notes: Option<String>,
}

impl QueueEntry {
    pub fn is_waiting(&self) -> bool {
        self.status == QueueStatus::Waiting
    }
}

/// Request to join the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub customer_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    /// Omitted or blank means the configured default service type
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl JoinRequest {
    /// Minimal walk-in request for the default service
    pub fn new(customer_name: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            phone: None,
            email: None,
            customer_type: CustomerType::default(),
            service_type: None,
            notes: None,
        }
    }

    pub fn with_customer_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = customer_type;
        self
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }
}

/// Request to change an entry's status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: QueueStatus,
    /// Observed service duration in minutes; feeds the service catalog
    #[serde(default)]
    pub actual_service_duration: Option<f64>,
}

impl StatusUpdate {
    pub fn new(status: QueueStatus) -> Self {
        Self {
            status,
            actual_service_duration: None,
        }
    }

    pub fn with_duration(mut self, minutes: f64) -> Self {
        self.actual_service_duration = Some(minutes);
        self
    }
}

/// Request to change the number of open counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountersUpdate {
    pub counters: i64,
}

/// Liveness summary reported by `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueHealth {
    pub status: String,
    pub timestamp: Timestamp,
    pub customers_waiting: usize,
    pub total_customers_created: u64,
}
