//! Wait time estimation for waiting customers
//!
//! This module holds the service catalog of baseline durations and the
//! estimator that turns a queue position into predicted wait and
//! turnaround times.

pub mod catalog;
pub mod estimator;

// Re-export commonly used types
pub use catalog::{ServiceCatalog, DEFAULT_BASELINE_MINUTES};
pub use estimator::{
    available_counters, legacy_estimate, EstimateInput, LegacyEstimate, LoadAwareEstimator,
    RushWindow, WaitEstimate, WaitTimeConfig, WaitTimeEstimator,
};
