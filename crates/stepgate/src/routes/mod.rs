//! HTTP route handlers for Stepgate.

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use stepgate_common::StepUpError;

mod auth;
mod health;
mod subjects;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        // Authentication attempts (called by the broker)
        .route("/auth/challenge", post(auth::begin_challenge))
        .route("/auth/verify", post(auth::verify_code))
        // Subject sync (broker-internal)
        .nest("/admin", admin_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admin routes (subject sync from the broker)
fn admin_routes() -> Router<AppState> {
    Router::new().route("/subjects", put(subjects::upsert_subject)).route(
        "/subjects/{id}",
        get(subjects::get_subject).delete(subjects::delete_subject),
    )
}

/// Map subsystem errors onto HTTP responses
pub(crate) fn error_response(err: StepUpError) -> (StatusCode, String) {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string())
}
