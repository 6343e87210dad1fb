//! Subject sync endpoints for the broker.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::error_response;
use crate::state::AppState;
use stepgate_common::Subject;

/// Upsert a subject record synced from the identity store
pub async fn upsert_subject(
    State(state): State<AppState>,
    Json(subject): Json<Subject>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .directory
        .save(&subject)
        .await
        .map_err(error_response)?;

    tracing::debug!(subject_id = %subject.id, "Subject synced");
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch a synced subject
pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Subject>, (StatusCode, String)> {
    match state.directory.find(&id).await.map_err(error_response)? {
        Some(subject) => Ok(Json(subject)),
        None => Err((StatusCode::NOT_FOUND, "subject not found".to_string())),
    }
}

/// Remove a synced subject
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.directory.remove(&id).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
