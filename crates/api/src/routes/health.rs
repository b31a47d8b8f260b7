use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use webaudit_core::types::Timestamp;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Server time of the check.
    pub timestamp: Timestamp,
    /// Screenshots received since startup.
    pub screenshots_count: usize,
}

/// GET /api/health -- relay liveness and upload count.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now(),
        screenshots_count: state.store.count().await,
    })
}

/// Mount health check routes (under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
