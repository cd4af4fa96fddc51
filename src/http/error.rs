//! Mapping from queue errors to HTTP responses

use crate::error::QueueError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Error returned by every API handler
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<QueueError>() {
            Some(QueueError::CustomerNotFound { .. }) => StatusCode::NOT_FOUND,
            Some(QueueError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = QueueError::not_found("abc").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid: ApiError = QueueError::invalid("bad").into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let broken: ApiError = QueueError::InvariantViolation {
            message: "misfiled".to_string(),
        }
        .into();
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let other: ApiError = anyhow::anyhow!("disk full").into();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
