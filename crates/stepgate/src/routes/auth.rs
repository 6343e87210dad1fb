//! Authentication attempt endpoints, called by the broker's login flow.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use super::error_response;
use crate::state::AppState;
use stepgate_common::{ChallengeOutcome, VerifyOutcome};

#[derive(Deserialize)]
pub struct ChallengeRequest {
    subject_id: String,
    /// Initiating client, checked against the exempt list
    client_id: Option<String>,
}

/// Begin an authentication attempt.
///
/// Responds `{"status": "ok"}` when no challenge is needed, or
/// `{"status": "challenge", "expires_in_secs": ...}` after a code was
/// issued and delivered. Re-posting while a challenge is pending resends
/// a fresh code that supersedes the old one.
pub async fn begin_challenge(
    State(state): State<AppState>,
    Json(payload): Json<ChallengeRequest>,
) -> Result<Json<ChallengeOutcome>, (StatusCode, String)> {
    state
        .flow
        .begin(&payload.subject_id, payload.client_id.as_deref())
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    subject_id: String,
    code: String,
}

/// Verify a submitted code.
///
/// - 200 `{"status": "verified"}` - attempt finalized, code consumed
/// - 401 `{"status": "invalid", "reason": ...}` - retry within the TTL
/// - 410 `{"status": "expired", "resend": true}` - offer the resend path
pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<(StatusCode, Json<VerifyOutcome>), (StatusCode, String)> {
    let outcome = state
        .flow
        .submit(&payload.subject_id, &payload.code)
        .await
        .map_err(error_response)?;

    let status = match outcome {
        VerifyOutcome::Verified => StatusCode::OK,
        VerifyOutcome::Expired { .. } => StatusCode::GONE,
        VerifyOutcome::Invalid { .. } => StatusCode::UNAUTHORIZED,
    };

    Ok((status, Json(outcome)))
}
