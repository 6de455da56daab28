//! Verification challenge endpoints.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use themis_common::{ApiCode, ApiResponse, CacheError};

use crate::challenge::CodeIssueError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EmailRequest {
    email: String,
}

/// Issue an emailed verification code. The code travels only by email.
pub async fn send_email_code(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Json<ApiResponse<()>> {
    match state.email_codes.issue(&payload.email).await {
        Ok(()) => Json(ApiResponse::ok_empty()),
        Err(CodeIssueError::InvalidEmail) => {
            Json(ApiResponse::err(ApiCode::InvalidEmailFormat))
        }
        Err(e) => {
            tracing::error!(error = %e, "email code issue failed");
            Json(ApiResponse::err(ApiCode::InternalError))
        }
    }
}

#[derive(Deserialize)]
pub struct PictureRequest {
    username: String,
}

#[derive(Serialize)]
pub struct PictureData {
    /// Rendered challenge as a base64 data URL
    image: String,
}

/// Issue a picture challenge; returns the rendered image only.
pub async fn send_picture_code(
    State(state): State<AppState>,
    Json(payload): Json<PictureRequest>,
) -> Json<ApiResponse<PictureData>> {
    match state.pictures.issue(&payload.username).await {
        Ok(image) => Json(ApiResponse::ok(PictureData { image })),
        Err(e) => {
            tracing::error!(error = %e, "picture challenge issue failed");
            Json(ApiResponse::err(ApiCode::InternalError))
        }
    }
}

#[derive(Deserialize)]
pub struct PictureAnswer {
    username: String,
    code: String,
}

/// Check a picture challenge answer.
pub async fn check_picture_code(
    State(state): State<AppState>,
    Json(payload): Json<PictureAnswer>,
) -> Json<ApiResponse<()>> {
    match state.pictures.verify(&payload.username, &payload.code).await {
        Ok(true) => Json(ApiResponse::ok_empty()),
        Ok(false) => Json(ApiResponse::err(ApiCode::CodeMismatch)),
        Err(CacheError::Expired) => Json(ApiResponse::err(ApiCode::CodeExpired)),
        Err(e) => {
            tracing::error!(error = %e, "picture challenge check failed");
            Json(ApiResponse::err(ApiCode::InternalError))
        }
    }
}
