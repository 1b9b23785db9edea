use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use super::{
    model::{AnswerRequest, SessionView, StartChallengeRequest, StartQuizRequest},
    service,
};
use crate::{ApiState, error::ApiError};

/// Create the session routes
pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/sessions/quiz", post(start_quiz))
        .route("/sessions/review", post(start_review))
        .route("/sessions/challenge", post(start_challenge))
        .route("/sessions/{id}", get(get_session).delete(exit_session))
        .route("/sessions/{id}/answer", post(submit_answer))
        .route("/sessions/{id}/next", post(next_question))
}

async fn start_quiz(
    State(state): State<ApiState>,
    Json(payload): Json<StartQuizRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let view = service::start_quiz(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn start_review(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let view = service::start_review(&state).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn start_challenge(
    State(state): State<ApiState>,
    Json(payload): Json<StartChallengeRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let view = service::start_challenge(&state, &payload.challenge_id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    service::view(&state, id).await.map(Json)
}

async fn submit_answer(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<SessionView>, ApiError> {
    service::submit_answer(&state, id, payload.answer)
        .await
        .map(Json)
}

async fn next_question(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    service::advance(&state, id).await.map(Json)
}

/// Abandon a session, or dismiss a finished one
async fn exit_session(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    service::exit(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
