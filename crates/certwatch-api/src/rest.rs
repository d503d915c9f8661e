//! REST API endpoints using Axum

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use certwatch_chain::{analyze_host, CertificateRecord};
use certwatch_probe::ChainProbe;
use chrono::Utc;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::ApiError;

/// Shared state for API handlers
///
/// Holds only the probe; no chain data survives a request.
#[derive(Clone)]
pub struct ApiState {
    pub probe: Arc<ChainProbe>,
}

/// Build the API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/analyze", get(analyze_domain))
        .route("/api/v1/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AnalyzeQuery {
    domain: Option<String>,
}

/// GET /api/v1/analyze?domain=example.com
///
/// Returns the leaf certificate record with the full chain nested
/// through `next`. A missing or empty domain is rejected before any
/// socket is opened.
async fn analyze_domain(
    State(state): State<ApiState>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<CertificateRecord>, ApiError> {
    let domain = query
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("domain query parameter is required".to_string()))?
        .to_string();

    match analyze_host(&state.probe, &domain).await {
        Ok(record) => {
            info!(%domain, days_remaining = record.days_remaining, "chain analyzed");
            Ok(Json(record))
        }
        Err(err) => {
            warn!(%domain, error = %err, "chain analysis failed");
            Err(err.into())
        }
    }
}

/// GET /api/v1/health - liveness check, no auth required
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use certwatch_probe::ProbeConfig;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let probe = ChainProbe::new(ProbeConfig::default()).expect("probe config");
        create_router(ApiState {
            probe: Arc::new(probe),
        })
    }

    #[tokio::test]
    async fn missing_domain_is_rejected() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/analyze")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_domain_is_rejected() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/analyze?domain=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
