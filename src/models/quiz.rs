// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;

/// Question kind. Decides how player selections behave (replace vs toggle)
/// and how the authoring payload is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Exactly one correct option; selecting replaces the prior selection.
    Single,
    /// One or more correct options; selecting toggles membership.
    Multi,
    /// Expanded server-side into exactly two options ("True"/"False").
    Boolean,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multi => "multi",
            QuestionKind::Boolean => "boolean",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(QuestionKind::Single),
            "multi" => Ok(QuestionKind::Multi),
            "boolean" => Ok(QuestionKind::Boolean),
            other => Err(AppError::Internal(format!("unknown question kind '{other}'"))),
        }
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,

    /// Visibility: 'public' or 'private'.
    pub access: String,

    pub author_id: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Player-facing quiz snapshot, assembled once per play-through.
///
/// Deliberately carries no correctness flags: the answer key never leaves the
/// server before grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub quiz: QuizMeta,
    pub questions: Vec<PlayQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizMeta {
    pub id: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayQuestion {
    pub id: i64,
    pub text: String,
    pub kind: QuestionKind,
    /// Per-question countdown, in seconds.
    pub time_limit_secs: i32,
    pub options: Vec<PlayOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayOption {
    pub id: i64,
    pub text: String,
}

/// DTO for creating a quiz together with its questions and options.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub category: String,
    /// 'public' or 'private'. Defaults to public.
    pub access: Option<String>,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    pub kind: QuestionKind,
    pub time_limit_secs: Option<i32>,
    /// For `single` and `multi` questions.
    #[serde(default)]
    pub options: Vec<NewOption>,
    /// For `boolean` questions: whether "True" is the correct option.
    pub correct: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct NewOption {
    pub text: String,
    pub is_correct: bool,
}

/// Normalized authoring payload handed to the store after validation.
/// Boolean questions have already been expanded into their two options.
#[derive(Debug, Clone)]
pub struct NewQuizData {
    pub title: String,
    pub description: String,
    pub category: String,
    pub access: String,
    pub questions: Vec<NewQuestionData>,
}

#[derive(Debug, Clone)]
pub struct NewQuestionData {
    pub text: String,
    pub kind: QuestionKind,
    pub time_limit_secs: i32,
    pub options: Vec<NewOptionData>,
}

#[derive(Debug, Clone)]
pub struct NewOptionData {
    pub text: String,
    pub is_correct: bool,
}
