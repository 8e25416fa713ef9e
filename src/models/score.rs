// src/models/score.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'scores' table: the score ledger.
/// Exactly one row exists per (user, quiz) pair; re-plays overwrite it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Score {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub correct_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated struct for displaying the leaderboard.
/// Represents a row joined from `users` and `scores`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One selected option for one question, as submitted by the player.
/// A `multi` question contributes one pair per selected option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub option_id: i64,
}

/// DTO for submitting a completed play-through.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Grading result echoed back to the player, together with the current
/// standings for the quiz.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub score: i64,
    pub correct_count: i64,
    pub total: i64,
    pub leaderboard: Vec<LeaderboardEntry>,
}
