pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dialogue::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Conversation
        .route("/api/v1/sessions", post(handlers::handle_start_session))
        .route("/api/v1/chat", post(handlers::handle_chat))
        // History
        .route("/api/v1/cover-letters", get(handlers::handle_cover_letters))
        .route(
            "/api/v1/interview-questions",
            get(handlers::handle_interview_questions),
        )
        .route(
            "/api/v1/viewed-postings",
            get(handlers::handle_viewed_postings),
        )
        .with_state(state)
}
