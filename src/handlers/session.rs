// src/handlers/session.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::session::{CreateSessionRequest, ResolvedSession},
    state::AppState,
    utils::{code::generate_join_code, jwt::Claims},
};

/// Starts a session for a quiz: a standing invitation to play, addressed by
/// its join code. The caller becomes the session owner.
///
/// The code may be supplied by the caller (fails with 409 if another live
/// session holds it) or generated here, in which case a collision is retried
/// with a fresh code.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let owner_id = claims.user_id()?;

    state
        .store
        .quiz_author(payload.quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("quiz not found".to_string()))?;

    if let Some(code) = &payload.code {
        let session_id = state
            .store
            .create_session(payload.quiz_id, owner_id, code)
            .await?;
        tracing::info!("session {session_id} opened with code {code}");
        return Ok((
            StatusCode::CREATED,
            Json(ResolvedSession {
                session_id,
                quiz_id: payload.quiz_id,
                code: code.clone(),
            }),
        ));
    }

    // Generated codes retry on the (unlikely) collision; a caller-supplied
    // code never does, the 409 is theirs to handle.
    let mut last_err = None;
    for _ in 0..4 {
        let code = generate_join_code();
        match state
            .store
            .create_session(payload.quiz_id, owner_id, &code)
            .await
        {
            Ok(session_id) => {
                tracing::info!("session {session_id} opened with code {code}");
                return Ok((
                    StatusCode::CREATED,
                    Json(ResolvedSession {
                        session_id,
                        quiz_id: payload.quiz_id,
                        code,
                    }),
                ));
            }
            Err(AppError::Conflict(msg)) => {
                tracing::warn!("generated join code collided, retrying");
                last_err = Some(AppError::Conflict(msg));
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_err.unwrap_or_else(|| AppError::Internal("code generation failed".to_string())))
}

/// Resolves a join code to its session and quiz.
pub async fn resolve_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .store
        .session_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;

    Ok(Json(ResolvedSession {
        session_id: session.id,
        quiz_id: session.quiz_id,
        code: session.code,
    }))
}

/// Lists open sessions with quiz metadata and the host's name.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.store.list_sessions().await?;
    Ok(Json(sessions))
}

/// Deletes a session by code. Allowed to the session owner or the author of
/// the backing quiz; anyone else gets 403 and the row stays. Hard delete —
/// the code becomes available again immediately.
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let requester_id = claims.user_id()?;

    let session = state
        .store
        .session_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;

    if requester_id != session.owner_id && requester_id != session.quiz_author_id {
        return Err(AppError::Forbidden(
            "only the session owner or the quiz author may delete a session".to_string(),
        ));
    }

    state.store.delete_session(session.id).await?;
    tracing::info!("user {requester_id} deleted session {code}");

    Ok(Json(json!({ "message": "deleted" })))
}
