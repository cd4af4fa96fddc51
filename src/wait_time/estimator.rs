//! Load-aware wait time estimation
//!
//! This module turns a queue position into a predicted wait and turnaround
//! from the service baseline, customer priority, counter load and the
//! time-of-day rush multiplier.

use crate::error::QueueError;
use crate::types::{CustomerType, Timestamp};
use crate::utils::round_to;
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inclusive range of local hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RushWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl RushWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

/// Configuration for wait time estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitTimeConfig {
    pub walk_in_multiplier: f64,
    pub appointment_multiplier: f64,
    pub vip_multiplier: f64,
    pub returning_multiplier: f64,
    /// Checked before the general rush windows
    pub lunch_rush: RushWindow,
    pub lunch_rush_multiplier: f64,
    pub rush_hours: Vec<RushWindow>,
    pub rush_hour_multiplier: f64,
    /// Weight given to an observed duration when updating a baseline
    pub baseline_blend_weight: f64,
}

impl Default for WaitTimeConfig {
    fn default() -> Self {
        Self {
            walk_in_multiplier: 1.0,
            appointment_multiplier: 0.9,
            vip_multiplier: 0.8,
            returning_multiplier: 0.85,
            lunch_rush: RushWindow::new(12, 13),
            lunch_rush_multiplier: 1.3,
            rush_hours: vec![RushWindow::new(9, 11), RushWindow::new(14, 16)],
            rush_hour_multiplier: 1.2,
            baseline_blend_weight: 0.5,
        }
    }
}

impl WaitTimeConfig {
    /// Same priorities, but no time-of-day scaling
    pub fn without_rush_hours() -> Self {
        Self {
            lunch_rush_multiplier: 1.0,
            rush_hours: Vec::new(),
            rush_hour_multiplier: 1.0,
            ..Self::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        let multipliers = [
            ("walk_in_multiplier", self.walk_in_multiplier),
            ("appointment_multiplier", self.appointment_multiplier),
            ("vip_multiplier", self.vip_multiplier),
            ("returning_multiplier", self.returning_multiplier),
            ("lunch_rush_multiplier", self.lunch_rush_multiplier),
            ("rush_hour_multiplier", self.rush_hour_multiplier),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(QueueError::ConfigurationError {
                    message: format!("{} must be a positive number", name),
                }
                .into());
            }
        }

        for window in std::iter::once(&self.lunch_rush).chain(self.rush_hours.iter()) {
            if window.start_hour > 23 || window.end_hour > 23 {
                return Err(QueueError::ConfigurationError {
                    message: format!(
                        "rush window {}-{} must use hours 0-23",
                        window.start_hour, window.end_hour
                    ),
                }
                .into());
            }
            if window.start_hour > window.end_hour {
                return Err(QueueError::ConfigurationError {
                    message: format!(
                        "rush window {}-{} starts after it ends",
                        window.start_hour, window.end_hour
                    ),
                }
                .into());
            }
        }

        if !(self.baseline_blend_weight > 0.0 && self.baseline_blend_weight <= 1.0) {
            return Err(QueueError::ConfigurationError {
                message: "baseline_blend_weight must be in (0, 1]".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Everything the estimator needs to know about one waiting customer and
/// the queue around them
#[derive(Debug, Clone, Copy)]
pub struct EstimateInput {
    pub position: usize,
    /// Catalog baseline for the customer's service type
    pub base_minutes: f64,
    pub customer_type: CustomerType,
    pub total_counters: u32,
    pub in_service: usize,
    pub now: Timestamp,
}

/// Predicted wait and turnaround in whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitEstimate {
    pub wait_minutes: i64,
    pub turnaround_minutes: i64,
}

/// Trait for estimating wait times
pub trait WaitTimeEstimator: Send + Sync {
    fn estimate(&self, input: &EstimateInput) -> WaitEstimate;

    /// Get the current configuration
    fn config(&self) -> &WaitTimeConfig;
}

/// Estimator driven by live counter load and time of day
#[derive(Debug, Clone)]
pub struct LoadAwareEstimator {
    config: WaitTimeConfig,
}

impl LoadAwareEstimator {
    pub fn new(config: WaitTimeConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn customer_multiplier(&self, customer_type: CustomerType) -> f64 {
        match customer_type {
            CustomerType::WalkIn => self.config.walk_in_multiplier,
            CustomerType::Appointment => self.config.appointment_multiplier,
            CustomerType::Vip => self.config.vip_multiplier,
            CustomerType::Returning => self.config.returning_multiplier,
        }
    }

    pub fn rush_multiplier(&self, hour: u32) -> f64 {
        if self.config.lunch_rush.contains(hour) {
            self.config.lunch_rush_multiplier
        } else if self.config.rush_hours.iter().any(|w| w.contains(hour)) {
            self.config.rush_hour_multiplier
        } else {
            1.0
        }
    }
}

/// Counters not occupied by a customer in service, never fewer than one
pub fn available_counters(total_counters: u32, in_service: usize) -> u32 {
    let free = i64::from(total_counters) - in_service as i64;
    free.max(1) as u32
}

impl WaitTimeEstimator for LoadAwareEstimator {
    fn estimate(&self, input: &EstimateInput) -> WaitEstimate {
        let base = input.base_minutes * self.customer_multiplier(input.customer_type);
        let available = available_counters(input.total_counters, input.in_service);
        let rush = self.rush_multiplier(input.now.hour());
        let ahead = input.position.saturating_sub(1) as f64;

        let wait_raw = (ahead * base * rush) / f64::from(available);
        let estimate = WaitEstimate {
            wait_minutes: wait_raw.floor() as i64,
            turnaround_minutes: (wait_raw + base).floor() as i64,
        };

        debug!(
            "Estimate for position {} ({}): base {:.2}, counters {}, rush {:.2} -> {:?}",
            input.position, input.customer_type, base, available, rush, estimate
        );

        estimate
    }

    fn config(&self) -> &WaitTimeConfig {
        &self.config
    }
}

impl Default for LoadAwareEstimator {
    fn default() -> Self {
        Self {
            config: WaitTimeConfig::default(),
        }
    }
}

/// Result of the stateless `/estimate` calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyEstimate {
    pub estimated_wait_time_minutes: f64,
    pub estimated_turnaround_time_minutes: f64,
}

/// Queue-length based estimate with no store interaction
pub fn legacy_estimate(
    queue_length: i64,
    avg_service_time: f64,
    counters: i64,
) -> crate::error::Result<LegacyEstimate> {
    if queue_length < 0 {
        return Err(QueueError::invalid("queue_length must not be negative").into());
    }
    if !avg_service_time.is_finite() || avg_service_time < 0.0 {
        return Err(QueueError::invalid("avg_service_time must be a non-negative number").into());
    }
    if counters < 1 {
        return Err(QueueError::invalid("counters must be at least 1").into());
    }

    let wait = (queue_length as f64 * avg_service_time) / counters as f64;
    Ok(LegacyEstimate {
        estimated_wait_time_minutes: round_to(wait, 2),
        estimated_turnaround_time_minutes: round_to(wait + avg_service_time, 2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at_hour(hour: u32) -> Timestamp {
        Local.with_ymd_and_hms(2024, 3, 4, hour, 30, 0).unwrap()
    }

    fn input(position: usize, customer_type: CustomerType, counters: u32, hour: u32) -> EstimateInput {
        EstimateInput {
            position,
            base_minutes: 15.0,
            customer_type,
            total_counters: counters,
            in_service: 0,
            now: at_hour(hour),
        }
    }

    #[test]
    fn test_wait_time_config_default() {
        let config = WaitTimeConfig::default();
        assert_eq!(config.vip_multiplier, 0.8);
        assert_eq!(config.lunch_rush_multiplier, 1.3);
        assert!(config.validate().is_ok());
        assert!(WaitTimeConfig::without_rush_hours().validate().is_ok());
    }

    #[test]
    fn test_wait_time_config_validation() {
        let mut config = WaitTimeConfig::default();
        config.vip_multiplier = 0.0;
        assert!(config.validate().is_err());

        config = WaitTimeConfig::default();
        config.rush_hours.push(RushWindow::new(18, 17));
        assert!(config.validate().is_err());

        config = WaitTimeConfig::default();
        config.lunch_rush = RushWindow::new(12, 24);
        assert!(config.validate().is_err());

        config = WaitTimeConfig::default();
        config.baseline_blend_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rush_multiplier_windows() {
        let estimator = LoadAwareEstimator::default();
        assert_eq!(estimator.rush_multiplier(8), 1.0);
        assert_eq!(estimator.rush_multiplier(9), 1.2);
        assert_eq!(estimator.rush_multiplier(11), 1.2);
        assert_eq!(estimator.rush_multiplier(12), 1.3);
        assert_eq!(estimator.rush_multiplier(13), 1.3);
        assert_eq!(estimator.rush_multiplier(14), 1.2);
        assert_eq!(estimator.rush_multiplier(16), 1.2);
        assert_eq!(estimator.rush_multiplier(17), 1.0);
        assert_eq!(estimator.rush_multiplier(0), 1.0);
    }

    #[test]
    fn test_lunch_rush_wins_over_overlapping_window() {
        let config = WaitTimeConfig {
            rush_hours: vec![RushWindow::new(9, 16)],
            ..WaitTimeConfig::default()
        };
        let estimator = LoadAwareEstimator::new(config).unwrap();
        assert_eq!(estimator.rush_multiplier(12), 1.3);
        assert_eq!(estimator.rush_multiplier(15), 1.2);
    }

    #[test]
    fn test_available_counters_floor() {
        assert_eq!(available_counters(3, 0), 3);
        assert_eq!(available_counters(3, 2), 1);
        assert_eq!(available_counters(1, 2), 1);
        assert_eq!(available_counters(3, 5), 1);
    }

    #[test]
    fn test_first_in_line_never_waits() {
        let estimator = LoadAwareEstimator::default();
        for hour in [8, 10, 12] {
            let estimate = estimator.estimate(&input(1, CustomerType::Vip, 1, hour));
            assert_eq!(estimate.wait_minutes, 0);
            assert_eq!(estimate.turnaround_minutes, 12);
        }
    }

    #[test]
    fn test_off_peak_walk_ins() {
        let estimator = LoadAwareEstimator::default();
        let expected = [(1, 0, 15), (2, 15, 30), (3, 30, 45)];
        for (position, wait, turnaround) in expected {
            let estimate = estimator.estimate(&input(position, CustomerType::WalkIn, 1, 8));
            assert_eq!(estimate.wait_minutes, wait);
            assert_eq!(estimate.turnaround_minutes, turnaround);
        }
    }

    #[test]
    fn test_customer_type_multipliers() {
        let estimator = LoadAwareEstimator::default();

        let vip = estimator.estimate(&input(2, CustomerType::Vip, 1, 8));
        assert_eq!((vip.wait_minutes, vip.turnaround_minutes), (12, 24));

        let appointment = estimator.estimate(&input(2, CustomerType::Appointment, 1, 8));
        assert_eq!(
            (appointment.wait_minutes, appointment.turnaround_minutes),
            (13, 27)
        );

        let returning = estimator.estimate(&input(2, CustomerType::Returning, 1, 8));
        assert_eq!(
            (returning.wait_minutes, returning.turnaround_minutes),
            (12, 25)
        );
    }

    #[test]
    fn test_rush_and_counters_combine() {
        let estimator = LoadAwareEstimator::default();

        // 10:30, two free counters: (1 * 15 * 1.2) / 2 = 9
        let morning = estimator.estimate(&input(2, CustomerType::WalkIn, 2, 10));
        assert_eq!((morning.wait_minutes, morning.turnaround_minutes), (9, 24));

        // 12:30, one counter: 1 * 15 * 1.3 = 19.5
        let lunch = estimator.estimate(&input(2, CustomerType::WalkIn, 1, 12));
        assert_eq!((lunch.wait_minutes, lunch.turnaround_minutes), (19, 34));

        // Lunch, VIP, three counters: (3 * 12 * 1.3) / 3 = 15.6
        let vip = estimator.estimate(&input(4, CustomerType::Vip, 3, 12));
        assert_eq!((vip.wait_minutes, vip.turnaround_minutes), (15, 27));
    }

    #[test]
    fn test_busy_counters_reduce_capacity() {
        let estimator = LoadAwareEstimator::default();
        let mut busy = input(3, CustomerType::WalkIn, 3, 8);
        busy.in_service = 2;
        let estimate = estimator.estimate(&busy);
        assert_eq!((estimate.wait_minutes, estimate.turnaround_minutes), (30, 45));
    }

    #[test]
    fn test_legacy_estimate() {
        let estimate = legacy_estimate(4, 12.5, 3).unwrap();
        assert_eq!(estimate.estimated_wait_time_minutes, 16.67);
        assert_eq!(estimate.estimated_turnaround_time_minutes, 29.17);

        let empty = legacy_estimate(0, 10.0, 1).unwrap();
        assert_eq!(empty.estimated_wait_time_minutes, 0.0);
        assert_eq!(empty.estimated_turnaround_time_minutes, 10.0);
    }

    #[test]
    fn test_legacy_estimate_rejects_bad_input() {
        assert!(legacy_estimate(3, 10.0, 0).is_err());
        assert!(legacy_estimate(-1, 10.0, 1).is_err());
        assert!(legacy_estimate(3, f64::NAN, 1).is_err());
        assert!(legacy_estimate(3, -2.0, 1).is_err());
    }
}
