//! Configuration management for the queue-desk service
//!
//! This module handles configuration loading from TOML files and
//! environment variables, validation, and default values.

pub mod app;

// Re-export commonly used types
pub use app::{clamp_counters, validate_config, AppConfig, QueueSettings, ServiceSettings};
