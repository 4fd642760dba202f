//! Error types for curio-viewer handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use curio_common::FetchError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// PID did not resolve (404)
    #[error("{0} not found")]
    NotFound(String),

    /// Upstream unreachable or answered non-2xx after the PID resolved (502)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream answered 2xx with an unusable body (502)
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Malformed { .. } => ApiError::MalformedUpstreamResponse(e.to_string()),
            FetchError::Transport { .. } | FetchError::Status { .. } => ApiError::UpstreamUnavailable(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
            ApiError::MalformedUpstreamResponse(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_MALFORMED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            error!(code = error_code, error = %self, "Request failed");
        }

        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::UpstreamUnavailable(msg)
            | ApiError::MalformedUpstreamResponse(msg)
            | ApiError::Internal(msg) => msg,
            ApiError::NotFound(pid) => format!("{} not found", pid),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_mapping() {
        let transport = FetchError::Transport {
            url: "http://x".to_string(),
            message: "refused".to_string(),
        };
        assert!(matches!(ApiError::from(transport), ApiError::UpstreamUnavailable(_)));

        let malformed = FetchError::Malformed {
            url: "http://x".to_string(),
            message: "eof".to_string(),
        };
        assert!(matches!(ApiError::from(malformed), ApiError::MalformedUpstreamResponse(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::UpstreamUnavailable("x".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::MalformedUpstreamResponse("x".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
