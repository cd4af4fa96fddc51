//! Utility functions for the queue service

use crate::types::{CustomerId, Timestamp};
use uuid::Uuid;

/// Generate a new unique customer ID
pub fn generate_customer_id() -> CustomerId {
    Uuid::new_v4()
}

/// Whole minutes elapsed from `from` to `to`, truncated toward zero
pub fn whole_minutes_between(from: Timestamp, to: Timestamp) -> i64 {
    to.signed_duration_since(from).num_seconds() / 60
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
