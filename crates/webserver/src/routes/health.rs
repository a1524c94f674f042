//! Liveness and Health Routes

use axum::{extract::State, Json};
use lifecycle::ServiceState;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceState,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Liveness probe
pub async fn ping() -> &'static str {
    "Postee is alive!"
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: *state.service_state.borrow(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
