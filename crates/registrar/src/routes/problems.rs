//! Problem endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use themis_common::{ApiCode, ApiResponse, ProblemSummary};

use crate::problems::{NewProblem, ProblemError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateProblemRequest {
    title: String,
    content: String,
    difficulty: String,
    max_runtime: i64,
    max_memory: i64,
    /// Raw test case payloads, each a JSON object with exactly
    /// `input` and `expected`
    test_cases: Vec<String>,
}

#[derive(Serialize)]
pub struct ProblemIdData {
    problem_id: String,
}

/// Create a problem together with its hidden test cases
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateProblemRequest>,
) -> Json<ApiResponse<ProblemIdData>> {
    let request = NewProblem {
        title: payload.title,
        content: payload.content,
        difficulty: payload.difficulty,
        max_runtime: payload.max_runtime,
        max_memory: payload.max_memory,
        test_cases: payload.test_cases,
    };
    match state.problems.create(request).await {
        Ok(problem_id) => Json(ApiResponse::ok(ProblemIdData { problem_id })),
        Err(e) => Json(fail(e)),
    }
}

/// List problems (summaries only)
pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<ProblemSummary>>> {
    match state.problems.list().await {
        Ok(problems) => Json(ApiResponse::ok(problems)),
        Err(e) => Json(fail(e)),
    }
}

/// Public problem view; test cases stay hidden.
#[derive(Serialize)]
pub struct ProblemDetail {
    id: String,
    title: String,
    content: String,
    difficulty: String,
    max_runtime: i64,
    max_memory: i64,
}

/// Fetch a single problem
pub async fn detail(
    State(state): State<AppState>,
    Path(problem_id): Path<String>,
) -> Json<ApiResponse<ProblemDetail>> {
    match state.problems.detail(&problem_id).await {
        Ok(p) => Json(ApiResponse::ok(ProblemDetail {
            id: p.id,
            title: p.title,
            content: p.content,
            difficulty: p.difficulty,
            max_runtime: p.max_runtime,
            max_memory: p.max_memory,
        })),
        Err(e) => Json(fail(e)),
    }
}

/// Acknowledged but rejected until its contract is specified
pub async fn update(
    State(state): State<AppState>,
    Path(problem_id): Path<String>,
) -> Json<ApiResponse<()>> {
    match state.problems.update(&problem_id).await {
        Ok(()) => Json(ApiResponse::ok_empty()),
        Err(e) => Json(fail(e)),
    }
}

/// Acknowledged but rejected until its contract is specified
pub async fn delete(
    State(state): State<AppState>,
    Path(problem_id): Path<String>,
) -> Json<ApiResponse<()>> {
    match state.problems.delete(&problem_id).await {
        Ok(()) => Json(ApiResponse::ok_empty()),
        Err(e) => Json(fail(e)),
    }
}

fn fail<T: Serialize>(e: ProblemError) -> ApiResponse<T> {
    let code = e.api_code();
    if code == ApiCode::InternalError {
        tracing::error!(error = %e, "problem dependency failure");
    }
    ApiResponse::err(code)
}
