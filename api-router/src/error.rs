use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use common::error::AppError;
use graph_store::GraphError;

/// HTTP-facing error taxonomy (§7): every [`AppError`] variant maps onto
/// one of these, and every variant maps onto exactly one status code.
#[derive(Error, Debug, Clone, Serialize)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    UpstreamTimeout(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl From<common::utils::search_limits::SearchValidationError> for ApiError {
    fn from(err: common::utils::search_limits::SearchValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<GraphError> for ApiError {
    /// Graph-store failures surface as `ServiceUnavailable` (§7) rather
    /// than `Internal` — a search/expand request failing because Neo4j is
    /// unreachable is the same externally-observable condition `/health`
    /// reports, not a bug in this service.
    fn from(err: GraphError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ApiError::Validation(msg),
            AppError::ServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            AppError::UpstreamTimeout(msg) => ApiError::UpstreamTimeout(msg),
            AppError::NotFound(msg) => ApiError::NotFound(msg),
            AppError::Neo4j(err) => ApiError::ServiceUnavailable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    status: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UpstreamTimeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse { error: self.to_string(), status: "error".to_string() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_422() {
        let api_err: ApiError = AppError::Validation("bad field".to_string()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn service_unavailable_maps_to_503() {
        let api_err: ApiError = AppError::ServiceUnavailable("graph down".to_string()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn processing_error_maps_to_500() {
        let api_err: ApiError = AppError::Processing("bad kg".to_string()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
