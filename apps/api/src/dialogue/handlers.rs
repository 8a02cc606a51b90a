use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::{StoredCoverLetter, StoredQuestion, ViewedPosting};

#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Uuid,
    pub user_input: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

/// POST /api/v1/sessions
pub async fn handle_start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), AppError> {
    let user_id = non_empty("user_id", &req.user_id)?;
    let session_id = state.chat.start_session(user_id).await?;
    Ok((StatusCode::CREATED, Json(StartSessionResponse { session_id })))
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let utterance = non_empty("user_input", &req.user_input)?;
    let message = state.chat.run_turn(req.session_id, utterance).await?;
    Ok(Json(ChatResponse { message }))
}

/// GET /api/v1/cover-letters
pub async fn handle_cover_letters(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<StoredCoverLetter>>, AppError> {
    let user_id = non_empty("user_id", &params.user_id)?;
    Ok(Json(state.memory.cover_letters(user_id).await?))
}

/// GET /api/v1/interview-questions
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<StoredQuestion>>, AppError> {
    let user_id = non_empty("user_id", &params.user_id)?;
    Ok(Json(state.memory.interview_questions(user_id).await?))
}

/// GET /api/v1/viewed-postings
pub async fn handle_viewed_postings(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ViewedPosting>>, AppError> {
    let user_id = non_empty("user_id", &params.user_id)?;
    Ok(Json(state.jobs.viewed_postings(user_id).await?))
}

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
