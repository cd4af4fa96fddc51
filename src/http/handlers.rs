//! Request handlers for the queue API

use crate::error::QueueError;
use crate::http::error::ApiError;
use crate::metrics::MetricsCollector;
use crate::queue::{AnalyticsSummary, QueueManager};
use crate::types::{
    CountersUpdate, CustomerId, JoinRequest, QueueEntry, QueueHealth, StatusUpdate,
};
use crate::wait_time::{legacy_estimate, LegacyEstimate};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// Shared state for every handler
#[derive(Clone)]
pub struct ApiState {
    pub queue: Arc<QueueManager>,
    pub metrics_collector: Arc<MetricsCollector>,
    pub service_name: String,
}

impl ApiState {
    pub fn new(queue: Arc<QueueManager>, service_name: impl Into<String>) -> Self {
        Self {
            metrics_collector: queue.metrics(),
            queue,
            service_name: service_name.into(),
        }
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Ids that do not parse can never name an entry
fn parse_customer_id(raw: &str) -> ApiResult<CustomerId> {
    raw.parse()
        .map_err(|_| ApiError::from(QueueError::not_found(raw)))
}

/// Root endpoint handler - shows service information
pub async fn root_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /queue/join",
            "GET /queue",
            "GET /queue/waiting",
            "GET /queue/{id}",
            "PUT /queue/{id}/status",
            "DELETE /queue/{id}",
            "GET /analytics/summary",
            "GET /next-customer",
            "POST /settings/counters",
            "GET /estimate",
            "GET /health",
            "GET /metrics"
        ]
    }))
}

pub async fn join_handler(
    State(state): State<ApiState>,
    Json(request): Json<JoinRequest>,
) -> ApiResult<(StatusCode, Json<QueueEntry>)> {
    let entry = state.queue.join(request)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_queue_handler(State(state): State<ApiState>) -> ApiResult<Json<Vec<QueueEntry>>> {
    Ok(Json(state.queue.list_entries()?))
}

pub async fn list_waiting_handler(
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<QueueEntry>>> {
    Ok(Json(state.queue.list_waiting()?))
}

pub async fn get_customer_handler(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<QueueEntry>> {
    let id = parse_customer_id(&raw_id)?;
    Ok(Json(state.queue.get_entry(&id)?))
}

pub async fn update_status_handler(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<QueueEntry>> {
    let id = parse_customer_id(&raw_id)?;
    Ok(Json(state.queue.update_status(&id, update)?))
}

pub async fn remove_customer_handler(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_customer_id(&raw_id)?;
    let removed = state.queue.remove(&id)?;
    Ok(Json(json!({
        "message": "Customer removed from queue",
        "id": removed.id
    })))
}

pub async fn analytics_handler(
    State(state): State<ApiState>,
) -> ApiResult<Json<AnalyticsSummary>> {
    Ok(Json(state.queue.analytics()?))
}

/// Head of the line, or a message when no one is waiting
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NextCustomer {
    Customer(QueueEntry),
    Empty { message: String },
}

pub async fn next_customer_handler(State(state): State<ApiState>) -> ApiResult<Json<NextCustomer>> {
    let next = match state.queue.next_customer()? {
        Some(entry) => NextCustomer::Customer(entry),
        None => NextCustomer::Empty {
            message: "No customers waiting".to_string(),
        },
    };
    Ok(Json(next))
}

pub async fn set_counters_handler(
    State(state): State<ApiState>,
    Json(update): Json<CountersUpdate>,
) -> ApiResult<Json<CountersUpdate>> {
    let counters = state.queue.set_counters(update.counters)?;
    Ok(Json(CountersUpdate {
        counters: i64::from(counters),
    }))
}

fn default_estimate_counters() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub queue_length: i64,
    pub avg_service_time: f64,
    #[serde(default = "default_estimate_counters")]
    pub counters: i64,
}

pub async fn estimate_handler(Query(query): Query<EstimateQuery>) -> ApiResult<Json<LegacyEstimate>> {
    debug!("Stateless estimate requested: {:?}", query);
    let estimate = legacy_estimate(query.queue_length, query.avg_service_time, query.counters)?;
    Ok(Json(estimate))
}

pub async fn health_handler(State(state): State<ApiState>) -> ApiResult<Json<QueueHealth>> {
    Ok(Json(state.queue.health()?))
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(state): State<ApiState>) -> Response {
    let metric_families = state.metrics_collector.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                [(header::CONTENT_TYPE, encoder.format_type().to_string())],
                output,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}
