//! HTTP route handlers for the registrar.
//!
//! Thin layer: decode the request, call the service, wrap the outcome in
//! the uniform `{code, msg, data}` envelope. Every handler answers HTTP
//! 200; the envelope code carries the outcome.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod challenge;
mod health;
mod identity;
mod problems;
mod submissions;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Accounts
        .route("/register", post(identity::register))
        .route("/login", post(identity::login))
        .route(
            "/users/{user_id}",
            get(identity::get_detail)
                .put(identity::update_detail)
                .delete(identity::delete),
        )
        .route("/user-id", post(identity::get_user_id))
        // Verification challenges
        .route("/send-email-code", post(challenge::send_email_code))
        .route("/send-code", post(challenge::send_picture_code))
        .route("/check-picture-code", post(challenge::check_picture_code))
        // Problems
        .route("/problem-list", get(problems::list))
        .route(
            "/problem/{problem_id}",
            get(problems::detail)
                .put(problems::update)
                .delete(problems::delete),
        )
        .route("/problem-create", post(problems::create))
        // Submissions (judging pipeline stub)
        .route("/submissions/code", post(submissions::submit))
        // Health & readiness
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
