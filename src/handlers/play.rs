// src/handlers/play.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::score::{SubmitRequest, SubmitResponse},
    play,
    state::AppState,
    utils::jwt::Claims,
};

/// Assembles the quiz behind a join code for play.
///
/// The snapshot is immutable for the session's lifetime and carries no
/// correctness flags — the answer key stays on the server until grading.
/// A quiz without questions is not playable (422).
pub async fn quiz_for_play(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .store
        .session_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;

    let snapshot = state.store.quiz_snapshot(session.quiz_id).await?;

    if snapshot.questions.is_empty() {
        return Err(AppError::InvalidState(
            "quiz has no questions".to_string(),
        ));
    }

    Ok(Json(snapshot))
}

/// Grades a completed play-through and records the score.
///
/// Submissions are accepted at any time — deadlines are advisory to the
/// player-facing flow, the authoritative result never depends on wall-clock
/// enforcement. Re-playing replaces the previous score for this (player,
/// quiz) pair; the ledger upsert makes a duplicate network retry harmless.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let player_id = claims.user_id()?;

    let session = state
        .store
        .session_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;

    let key = state.store.answer_key(session.quiz_id).await?;
    let outcome = play::grade(&key, &payload.answers)?;

    state
        .store
        .record_score(player_id, session.quiz_id, outcome.score, outcome.correct_count)
        .await?;

    tracing::info!(
        "player {player_id} scored {}/{} on quiz {} (session {code})",
        outcome.score,
        outcome.total,
        session.quiz_id
    );

    let leaderboard = state.store.leaderboard(session.quiz_id).await?;

    Ok(Json(SubmitResponse {
        score: outcome.score,
        correct_count: outcome.correct_count,
        total: outcome.total,
        leaderboard,
    }))
}

/// Standings for a session, scoped through its underlying quiz: everyone who
/// has a ledger row for that quiz, ranked deterministically.
pub async fn results(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .store
        .session_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;

    let entries = state.store.leaderboard(session.quiz_id).await?;
    Ok(Json(entries))
}
