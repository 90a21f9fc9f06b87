use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::schemas::{HealthResponse, MetricsResponse};

/// `GET /health` -- returns service status together with a metrics snapshot.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snap = state.gateway.metrics().snapshot();
    let body = HealthResponse {
        status: "ok".into(),
        metrics: MetricsResponse::from(snap),
    };
    (StatusCode::OK, Json(body))
}

/// `GET /metrics` -- returns pipeline counters as JSON.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snap = state.gateway.metrics().snapshot();
    (StatusCode::OK, Json(MetricsResponse::from(snap)))
}
