//! Submission intake.
//!
//! The judging pipeline is an external collaborator; until one is wired
//! into the state, submissions are acknowledged as unsupported.

use axum::{Json, extract::State};

use themis_common::{ApiCode, ApiResponse, SubmissionRequest};

use crate::state::AppState;

/// Hand a submission to the judging pipeline
pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmissionRequest>,
) -> Json<ApiResponse<()>> {
    let Some(judge) = &state.judge else {
        tracing::warn!(problem_id = %payload.problem_id, "submission received with no judge wired");
        return Json(ApiResponse::err(ApiCode::Unimplemented));
    };

    match judge.submit(payload).await {
        Ok(()) => Json(ApiResponse::ok_empty()),
        Err(e) => {
            tracing::error!(error = %e, "judge enqueue failed");
            Json(ApiResponse::err(ApiCode::InternalError))
        }
    }
}
