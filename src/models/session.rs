// src/models/session.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'sessions' table in the database.
/// A session is a standing invitation to play one quiz, addressed by its
/// short join code. It references the quiz, it does not own it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub code: String,
    pub quiz_id: i64,
    pub owner_id: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Session row joined with the backing quiz's author, for authorization
/// decisions (deletion is allowed to the session owner or the quiz author).
#[derive(Debug, Clone, FromRow)]
pub struct SessionMeta {
    pub id: i64,
    pub code: String,
    pub quiz_id: i64,
    pub owner_id: i64,
    pub quiz_author_id: i64,
}

/// Open-session listing joined with quiz metadata and the host's username.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionOverview {
    pub session_id: i64,
    pub code: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub access: String,
    pub host: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for starting a session. The join code may be caller-supplied; when
/// absent the server generates one.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub quiz_id: i64,
    #[validate(length(min = 4, max = 16))]
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolvedSession {
    pub session_id: i64,
    pub quiz_id: i64,
    pub code: String,
}
