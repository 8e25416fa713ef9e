// src/store/mod.rs

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::quiz::{NewQuizData, Quiz, QuizSnapshot};
use crate::models::score::LeaderboardEntry;
use crate::models::session::{SessionMeta, SessionOverview};
use crate::models::user::User;
use crate::play::AnswerKey;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Named repository operations behind one interface, so handlers and the
/// grading path are testable against [`MemoryStore`] without a database.
///
/// Authorization decisions stay in the handlers; the store only reads and
/// writes rows. Every method is an I/O boundary and may be slow — no caller
/// holds an in-memory lock across these calls.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    // Quiz authoring. `create_quiz` inserts the quiz with all questions and
    // options in one transaction; nothing persists on failure.
    async fn create_quiz(&self, author_id: i64, quiz: &NewQuizData) -> Result<i64, AppError>;
    async fn list_quizzes_for(&self, viewer_id: i64) -> Result<Vec<Quiz>, AppError>;
    async fn quiz_author(&self, quiz_id: i64) -> Result<Option<i64>, AppError>;
    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), AppError>;

    // Session registry. A duplicate live join code fails with `Conflict`;
    // deleting a session frees its code for reuse.
    async fn create_session(
        &self,
        quiz_id: i64,
        owner_id: i64,
        code: &str,
    ) -> Result<i64, AppError>;
    async fn session_by_code(&self, code: &str) -> Result<Option<SessionMeta>, AppError>;
    async fn list_sessions(&self) -> Result<Vec<SessionOverview>, AppError>;
    async fn delete_session(&self, session_id: i64) -> Result<(), AppError>;

    // Quiz assembly
    async fn quiz_snapshot(&self, quiz_id: i64) -> Result<QuizSnapshot, AppError>;
    async fn answer_key(&self, quiz_id: i64) -> Result<AnswerKey, AppError>;

    /// Score ledger upsert: at most one row per (user, quiz), later writes
    /// overwrite score, correct count and timestamp. Must be atomic — two
    /// concurrent submissions for the same pair serialize on the row instead
    /// of racing past an existence check.
    async fn record_score(
        &self,
        user_id: i64,
        quiz_id: i64,
        score: i64,
        correct_count: i64,
    ) -> Result<(), AppError>;

    /// Ranking for one quiz: score descending, then earliest timestamp, then
    /// player id — a deterministic total order.
    async fn leaderboard(&self, quiz_id: i64) -> Result<Vec<LeaderboardEntry>, AppError>;
}
