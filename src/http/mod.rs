//! HTTP API for the queue service
//!
//! This module exposes the queue operations, analytics, health and
//! Prometheus metrics over axum.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use handlers::{ApiState, NextCustomer};
pub use server::{create_router, HttpServer, HttpServerConfig};
