//! Error-to-response mapping for the REST layer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use certwatch_chain::AnalyzeError;
use certwatch_probe::ProbeError;
use serde::{Deserialize, Serialize};

/// Error payload returned to API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures surfaced by API handlers
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request, rejected before any network call
    BadRequest(String),
    /// Probe deadline exceeded
    GatewayTimeout(String),
    /// The target could not be reached or its chain not analyzed
    BadGateway(String),
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        match &err {
            AnalyzeError::Probe(ProbeError::Input(_)) => ApiError::BadRequest(err.to_string()),
            AnalyzeError::Probe(ProbeError::Timeout { .. }) => {
                ApiError::GatewayTimeout(err.to_string())
            }
            AnalyzeError::Probe(_) | AnalyzeError::Chain(_) => {
                ApiError::BadGateway(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
