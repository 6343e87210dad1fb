//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check (is the server running?)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    storage: bool,
}

/// Readiness check (is the configured storage backend reachable?)
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadyResponse>, StatusCode> {
    let storage_ok = match &state.redis {
        Some(conn) => {
            let mut conn = conn.clone();
            let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
            result.is_ok()
        }
        // The memory backend is always reachable
        None => true,
    };

    if storage_ok {
        Ok(Json(ReadyResponse {
            status: "ready",
            storage: true,
        }))
    } else {
        // Return 503 if not ready
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
