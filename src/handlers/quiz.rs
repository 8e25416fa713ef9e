// src/handlers/quiz.rs

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
    models::quiz::{
        CreateQuizRequest, NewOptionData, NewQuestion, NewQuestionData, NewQuizData, QuestionKind,
    },
    state::AppState,
    utils::jwt::Claims,
};

const DEFAULT_TIME_LIMIT_SECS: i32 = 60;
const MAX_TIME_LIMIT_SECS: i32 = 3600;

/// Creates a quiz together with its questions and answer options, in a single
/// transaction. The authenticated caller becomes the author.
///
/// This is where the data-model invariants are enforced: every question ends
/// up with at least one option and at least one correct option, `single`
/// questions with exactly one correct option, and `boolean` questions are
/// expanded into their two fixed options server-side.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let author_id = claims.user_id()?;

    if payload.questions.is_empty() {
        return Err(AppError::InvalidInput(
            "a quiz needs at least one question".to_string(),
        ));
    }

    let access = match payload.access.as_deref() {
        None | Some("public") => "public",
        Some("private") => "private",
        Some(other) => {
            return Err(AppError::InvalidInput(format!(
                "unknown access level '{other}'"
            )));
        }
    };

    let questions = payload
        .questions
        .iter()
        .map(normalize_question)
        .collect::<Result<Vec<_>, AppError>>()?;

    let quiz = NewQuizData {
        title: payload.title.clone(),
        description: payload.description.clone(),
        category: payload.category.clone(),
        access: access.to_string(),
        questions,
    };

    let quiz_id = state.store.create_quiz(author_id, &quiz).await?;
    tracing::info!("user {author_id} created quiz {quiz_id} ({})", quiz.title);

    Ok((StatusCode::CREATED, Json(json!({ "quiz_id": quiz_id }))))
}

fn normalize_question(question: &NewQuestion) -> Result<NewQuestionData, AppError> {
    if question.text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "question text cannot be empty".to_string(),
        ));
    }

    let time_limit_secs = question.time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS);
    if !(1..=MAX_TIME_LIMIT_SECS).contains(&time_limit_secs) {
        return Err(AppError::InvalidInput(format!(
            "time limit must be between 1 and {MAX_TIME_LIMIT_SECS} seconds"
        )));
    }

    let options = match question.kind {
        QuestionKind::Boolean => {
            let correct = question.correct.ok_or_else(|| {
                AppError::InvalidInput(
                    "boolean questions need a 'correct' flag".to_string(),
                )
            })?;
            vec![
                NewOptionData {
                    text: "True".to_string(),
                    is_correct: correct,
                },
                NewOptionData {
                    text: "False".to_string(),
                    is_correct: !correct,
                },
            ]
        }
        QuestionKind::Single | QuestionKind::Multi => {
            if question.options.is_empty() {
                return Err(AppError::InvalidInput(
                    "choice questions need at least one option".to_string(),
                ));
            }
            if question.options.iter().any(|o| o.text.trim().is_empty()) {
                return Err(AppError::InvalidInput(
                    "option text cannot be empty".to_string(),
                ));
            }
            let correct_count = question.options.iter().filter(|o| o.is_correct).count();
            match question.kind {
                QuestionKind::Single if correct_count != 1 => {
                    return Err(AppError::InvalidInput(
                        "single-choice questions need exactly one correct option".to_string(),
                    ));
                }
                QuestionKind::Multi if correct_count == 0 => {
                    return Err(AppError::InvalidInput(
                        "multi-choice questions need at least one correct option".to_string(),
                    ));
                }
                _ => {}
            }
            question
                .options
                .iter()
                .map(|o| NewOptionData {
                    text: o.text.clone(),
                    is_correct: o.is_correct,
                })
                .collect()
        }
    };

    Ok(NewQuestionData {
        text: question.text.clone(),
        kind: question.kind,
        time_limit_secs,
        options,
    })
}

/// Lists quizzes visible to the caller: public ones plus their own.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let viewer_id = claims.user_id()?;
    let quizzes = state.store.list_quizzes_for(viewer_id).await?;
    Ok(Json(quizzes))
}

/// Deletes a quiz. Author only; cascades to questions, options, sessions and
/// ledger rows.
pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let requester_id = claims.user_id()?;

    let author_id = state
        .store
        .quiz_author(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("quiz not found".to_string()))?;

    if author_id != requester_id {
        return Err(AppError::Forbidden(
            "only the author may delete a quiz".to_string(),
        ));
    }

    state.store.delete_quiz(quiz_id).await?;
    tracing::info!("user {requester_id} deleted quiz {quiz_id}");

    Ok(Json(json!({ "message": "deleted" })))
}

/// Current standings for one quiz.
pub async fn quiz_leaderboard(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .store
        .quiz_author(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("quiz not found".to_string()))?;

    let entries = state.store.leaderboard(quiz_id).await?;
    Ok(Json(entries))
}
