//! HTTP error mapping (spec §7), grounded on the teacher's
//! `mofa-gateway::error::GatewayError` match-arm-per-kind pattern.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use taskcore_kernel::error::TaskCoreError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
}

/// Newtype so the gateway can implement `IntoResponse` for a foreign error
/// type without a blanket orphan-rule conflict.
pub struct ApiError(pub TaskCoreError);

impl From<TaskCoreError> for ApiError {
    fn from(e: TaskCoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TaskCoreError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskCoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            TaskCoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            TaskCoreError::InvalidInput(_) | TaskCoreError::StaleVersion { .. } => StatusCode::BAD_REQUEST,
            TaskCoreError::PolicyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TaskCoreError::Timeout { .. } | TaskCoreError::Network(_) | TaskCoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TaskCoreError::PluginFailure { .. } | TaskCoreError::PlannerError(_) | TaskCoreError::CheckpointExpired(_) | TaskCoreError::Cancelled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody { error: ErrorDetail { kind: self.0.kind(), message: self.0.to_string() } };
        (status, Json(body)).into_response()
    }
}
