// src/handlers/live.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    live::{LiveEngine, roster},
    models::{
        participant::{JoinRequest, PlayerSummary},
        session::{CreateSessionRequest, CreateSessionResponse, SessionSnapshot},
    },
    utils::jwt::{Claims, sign_host_token},
};

/// Opens a new session on one of the caller's quizzes.
///
/// Returns 201 with the join code and the host token the host socket
/// must present on `host_join`.
pub async fn create_session(
    State(engine): State<LiveEngine>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let host_id = claims.user_id()?;
    let store = engine.store();

    // Someone else's quiz looks the same as a missing one.
    let quiz = store
        .quiz(quiz_id)
        .await?
        .filter(|q| q.creator_id == host_id)
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

    let max_players = payload.max_players.unwrap_or(config.live.max_players);
    let session = store.create_session(quiz.id, host_id, max_players).await?;
    let host_token = sign_host_token(host_id, &session.pin, &config.jwt_secret, config.jwt_expiration)?;

    tracing::info!(pin = %session.pin, quiz_id, host_id, "live session created");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id,
            pin: session.pin,
            status: session.status,
            max_players: session.max_players,
            host_token,
        }),
    ))
}

/// Registers a guest in a lobby. No account needed.
///
/// 404 for an unknown PIN, 409 when the game already started, the
/// nickname is taken or the lobby is full.
pub async fn join_session(
    State(engine): State<LiveEngine>,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let participant = roster::join(engine.store(), &payload.pin, &payload.nickname, payload.avatar_id).await?;

    Ok((StatusCode::CREATED, Json(participant)))
}

/// Read-only view of a session for clients that poll instead of listening.
pub async fn session_snapshot(
    State(engine): State<LiveEngine>,
    Path(pin): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = engine.store();
    let session = store
        .session(&pin)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", pin)))?;

    let quiz_title = store
        .quiz(session.quiz_id)
        .await?
        .map(|q| q.title)
        .unwrap_or_default();
    let total_questions = store.questions(session.quiz_id).await?.len();
    let players: Vec<PlayerSummary> = roster::list(store, &pin).await?.iter().map(PlayerSummary::from).collect();

    Ok(Json(SessionSnapshot {
        status: session.status,
        quiz_title,
        total_questions,
        current_question: session.current_question_index,
        player_count: players.len(),
        players,
    }))
}
