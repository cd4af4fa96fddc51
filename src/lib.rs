//! Queue Desk - service-counter queue with live wait estimates
//!
//! This crate tracks customers waiting for a pool of service counters,
//! keeps positions and wait estimates reconciled after every change, and
//! serves the queue over an HTTP API.

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod queue;
pub mod service;
pub mod types;
pub mod utils;
pub mod wait_time;

// Re-export commonly used types and traits
pub use error::{QueueError, Result};
pub use types::*;

// Re-export key components
pub use clock::{Clock, ManualClock, SystemClock};
pub use queue::QueueManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
