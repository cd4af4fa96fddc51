//! Error types for the queue service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific queue scenarios
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Customer not found: {customer_id}")]
    CustomerNotFound { customer_id: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Queue invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl QueueError {
    /// Shorthand for an unknown customer id
    pub fn not_found(customer_id: impl ToString) -> Self {
        QueueError::CustomerNotFound {
            customer_id: customer_id.to_string(),
        }
    }

    /// Shorthand for a rejected request
    pub fn invalid(reason: impl Into<String>) -> Self {
        QueueError::InvalidRequest {
            reason: reason.into(),
        }
    }
}
