//! Account endpoints: register, login, detail, update, delete.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use themis_common::{ApiCode, ApiResponse, UserProfile};

use crate::identity::{Credentials, IdentityError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AuthRequest {
    username: String,
    password: String,
    email: String,
    code: String,
}

impl AuthRequest {
    fn into_credentials(self) -> Credentials {
        Credentials {
            username: self.username,
            password: self.password,
            email: self.email,
            code: self.code,
        }
    }
}

#[derive(Serialize)]
pub struct TokenData {
    token: String,
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<AuthRequest>,
) -> Json<ApiResponse<TokenData>> {
    match state.identity.register(&payload.into_credentials()).await {
        Ok(token) => Json(ApiResponse::ok(TokenData { token })),
        Err(e) => Json(fail(e)),
    }
}

/// Log in to an existing account
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AuthRequest>,
) -> Json<ApiResponse<TokenData>> {
    match state.identity.login(&payload.into_credentials()).await {
        Ok(token) => Json(ApiResponse::ok(TokenData { token })),
        Err(e) => Json(fail(e)),
    }
}

/// Fetch a user's profile (password hash never included)
pub async fn get_detail(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Json<ApiResponse<UserProfile>> {
    match state.identity.get_detail(user_id).await {
        Ok(profile) => Json(ApiResponse::ok(profile)),
        Err(e) => Json(fail(e)),
    }
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    /// New email; empty means unchanged
    #[serde(default)]
    email: String,

    /// New password; empty means unchanged
    #[serde(default)]
    password: String,

    /// Verification code for the new email, required when email is set
    #[serde(default)]
    code: String,
}

/// Update email and/or password
pub async fn update_detail(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateRequest>,
) -> Json<ApiResponse<()>> {
    match state
        .identity
        .update_detail(user_id, &payload.email, &payload.password, &payload.code)
        .await
    {
        Ok(()) => Json(ApiResponse::ok_empty()),
        Err(e) => Json(fail(e)),
    }
}

/// Hard-delete an account
pub async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Json<ApiResponse<()>> {
    match state.identity.delete(user_id).await {
        Ok(()) => Json(ApiResponse::ok_empty()),
        Err(e) => Json(fail(e)),
    }
}

#[derive(Deserialize)]
pub struct UsernameRequest {
    username: String,
}

#[derive(Serialize)]
pub struct UserIdData {
    user_id: i64,
}

/// Look up a user id by username
pub async fn get_user_id(
    State(state): State<AppState>,
    Json(payload): Json<UsernameRequest>,
) -> Json<ApiResponse<UserIdData>> {
    match state.identity.get_id_by_username(&payload.username).await {
        Ok(user_id) => Json(ApiResponse::ok(UserIdData { user_id })),
        Err(e) => Json(fail(e)),
    }
}

fn fail<T: serde::Serialize>(e: IdentityError) -> ApiResponse<T> {
    let code = e.api_code();
    if code == ApiCode::InternalError {
        tracing::error!(error = %e, "identity dependency failure");
    }
    ApiResponse::err(code)
}
