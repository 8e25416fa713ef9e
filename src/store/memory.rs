// src/store/memory.rs

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::quiz::{
    NewQuizData, PlayOption, PlayQuestion, QuestionKind, Quiz, QuizMeta, QuizSnapshot,
};
use crate::models::score::LeaderboardEntry;
use crate::models::session::{Session, SessionMeta, SessionOverview};
use crate::models::user::User;
use crate::play::AnswerKey;
use crate::store::Store;

/// In-memory [`Store`] with the same observable semantics as [`PgStore`],
/// used by the integration tests (and as a throwaway backend for demos).
/// All state sits behind one mutex; no lock is ever held across an await.
///
/// [`PgStore`]: crate::store::PgStore
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: Vec<User>,
    quizzes: Vec<Quiz>,
    questions: Vec<QuestionRec>,
    options: Vec<OptionRec>,
    sessions: Vec<Session>,
    scores: Vec<ScoreRec>,
}

struct QuestionRec {
    id: i64,
    quiz_id: i64,
    text: String,
    kind: QuestionKind,
    time_limit_secs: i32,
    position: i32,
}

struct OptionRec {
    id: i64,
    question_id: i64,
    text: String,
    is_correct: bool,
}

struct ScoreRec {
    user_id: i64,
    quiz_id: i64,
    score: i64,
    correct_count: i64,
    created_at: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username_of(&self, user_id: i64) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.username == username) {
            return Err(AppError::Conflict("already exists".to_string()));
        }
        let user = User {
            id: inner.alloc_id(),
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: Some(Utc::now()),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_quiz(&self, author_id: i64, quiz: &NewQuizData) -> Result<i64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let quiz_id = inner.alloc_id();
        let now = Utc::now();
        inner.quizzes.push(Quiz {
            id: quiz_id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            category: quiz.category.clone(),
            access: quiz.access.clone(),
            author_id,
            created_at: Some(now),
            updated_at: Some(now),
        });
        for (position, question) in quiz.questions.iter().enumerate() {
            let question_id = inner.alloc_id();
            inner.questions.push(QuestionRec {
                id: question_id,
                quiz_id,
                text: question.text.clone(),
                kind: question.kind,
                time_limit_secs: question.time_limit_secs,
                position: position as i32,
            });
            for option in &question.options {
                let option_id = inner.alloc_id();
                inner.options.push(OptionRec {
                    id: option_id,
                    question_id,
                    text: option.text.clone(),
                    is_correct: option.is_correct,
                });
            }
        }
        Ok(quiz_id)
    }

    async fn list_quizzes_for(&self, viewer_id: i64) -> Result<Vec<Quiz>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut quizzes: Vec<Quiz> = inner
            .quizzes
            .iter()
            .filter(|q| q.access == "public" || q.author_id == viewer_id)
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(quizzes)
    }

    async fn quiz_author(&self, quiz_id: i64) -> Result<Option<i64>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .map(|q| q.author_id))
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.quizzes.retain(|q| q.id != quiz_id);
        let question_ids: Vec<i64> = inner
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .map(|q| q.id)
            .collect();
        inner.questions.retain(|q| q.quiz_id != quiz_id);
        inner
            .options
            .retain(|o| !question_ids.contains(&o.question_id));
        inner.sessions.retain(|s| s.quiz_id != quiz_id);
        inner.scores.retain(|s| s.quiz_id != quiz_id);
        Ok(())
    }

    async fn create_session(
        &self,
        quiz_id: i64,
        owner_id: i64,
        code: &str,
    ) -> Result<i64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.sessions.iter().any(|s| s.code == code) {
            return Err(AppError::Conflict(format!(
                "join code '{code}' is already in use"
            )));
        }
        let session_id = inner.alloc_id();
        inner.sessions.push(Session {
            id: session_id,
            code: code.to_string(),
            quiz_id,
            owner_id,
            created_at: Some(Utc::now()),
        });
        Ok(session_id)
    }

    async fn session_by_code(&self, code: &str) -> Result<Option<SessionMeta>, AppError> {
        let inner = self.inner.lock().unwrap();
        let Some(session) = inner.sessions.iter().find(|s| s.code == code) else {
            return Ok(None);
        };
        let quiz_author_id = inner
            .quizzes
            .iter()
            .find(|q| q.id == session.quiz_id)
            .map(|q| q.author_id)
            .ok_or_else(|| AppError::NotFound("quiz not found".to_string()))?;
        Ok(Some(SessionMeta {
            id: session.id,
            code: session.code.clone(),
            quiz_id: session.quiz_id,
            owner_id: session.owner_id,
            quiz_author_id,
        }))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionOverview>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut overviews: Vec<SessionOverview> = inner
            .sessions
            .iter()
            .filter_map(|s| {
                let quiz = inner.quizzes.iter().find(|q| q.id == s.quiz_id)?;
                Some(SessionOverview {
                    session_id: s.id,
                    code: s.code.clone(),
                    title: quiz.title.clone(),
                    category: quiz.category.clone(),
                    description: quiz.description.clone(),
                    access: quiz.access.clone(),
                    host: inner.username_of(s.owner_id),
                    created_at: s.created_at,
                })
            })
            .collect();
        overviews.sort_by(|a, b| b.session_id.cmp(&a.session_id));
        Ok(overviews)
    }

    async fn delete_session(&self, session_id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.retain(|s| s.id != session_id);
        Ok(())
    }

    async fn quiz_snapshot(&self, quiz_id: i64) -> Result<QuizSnapshot, AppError> {
        let inner = self.inner.lock().unwrap();
        let quiz = inner
            .quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| AppError::NotFound("quiz not found".to_string()))?;

        let mut question_recs: Vec<&QuestionRec> = inner
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .collect();
        question_recs.sort_by_key(|q| (q.position, q.id));

        let questions = question_recs
            .into_iter()
            .map(|q| PlayQuestion {
                id: q.id,
                text: q.text.clone(),
                kind: q.kind,
                time_limit_secs: q.time_limit_secs,
                options: inner
                    .options
                    .iter()
                    .filter(|o| o.question_id == q.id)
                    .map(|o| PlayOption {
                        id: o.id,
                        text: o.text.clone(),
                    })
                    .collect(),
            })
            .collect();

        Ok(QuizSnapshot {
            quiz: QuizMeta {
                id: quiz.id,
                title: quiz.title.clone(),
                description: quiz.description.clone(),
            },
            questions,
        })
    }

    async fn answer_key(&self, quiz_id: i64) -> Result<AnswerKey, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut key = AnswerKey::new();
        for question in inner.questions.iter().filter(|q| q.quiz_id == quiz_id) {
            key.add_question(question.id);
            for option in inner
                .options
                .iter()
                .filter(|o| o.question_id == question.id && o.is_correct)
            {
                key.add_correct_option(question.id, option.id);
            }
        }
        Ok(key)
    }

    async fn record_score(
        &self,
        user_id: i64,
        quiz_id: i64,
        score: i64,
        correct_count: i64,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        match inner
            .scores
            .iter_mut()
            .find(|s| s.user_id == user_id && s.quiz_id == quiz_id)
        {
            Some(row) => {
                row.score = score;
                row.correct_count = correct_count;
                row.created_at = now;
            }
            None => inner.scores.push(ScoreRec {
                user_id,
                quiz_id,
                score,
                correct_count,
                created_at: now,
            }),
        }
        Ok(())
    }

    async fn leaderboard(&self, quiz_id: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<(&ScoreRec, String)> = inner
            .scores
            .iter()
            .filter(|s| s.quiz_id == quiz_id)
            .map(|s| (s, inner.username_of(s.user_id)))
            .collect();
        // Score descending, then earliest submission, then player id: a total
        // order, so equal scores never shuffle between queries.
        rows.sort_by(|(a, _), (b, _)| {
            b.score
                .cmp(&a.score)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(rows
            .into_iter()
            .map(|(s, username)| LeaderboardEntry {
                username,
                score: s.score,
                created_at: s.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, name: &str) -> i64 {
        store.create_user(name, "hash").await.unwrap().id
    }

    #[tokio::test]
    async fn record_score_keeps_one_row_with_the_last_write() {
        let store = MemoryStore::new();
        let player = seed_user(&store, "alice").await;

        store.record_score(player, 7, 3, 3).await.unwrap();
        store.record_score(player, 7, 1, 1).await.unwrap();

        let board = store.leaderboard(7).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].score, 1);
    }

    #[tokio::test]
    async fn duplicate_code_conflicts_until_the_session_is_deleted() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "host").await;

        let first = store.create_session(1, owner, "ROOM42").await.unwrap();
        let err = store.create_session(1, owner, "ROOM42").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        store.delete_session(first).await.unwrap();
        store.create_session(1, owner, "ROOM42").await.unwrap();
    }

    #[tokio::test]
    async fn leaderboard_breaks_ties_by_timestamp_then_player_id() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "ann").await;
        let b = seed_user(&store, "bob").await;
        let c = seed_user(&store, "cid").await;

        let early: DateTime<Utc> = "2026-03-01T10:00:00Z".parse().unwrap();
        let late: DateTime<Utc> = "2026-03-01T11:00:00Z".parse().unwrap();
        {
            // Craft exact ties to pin the ordering down.
            let mut inner = store.inner.lock().unwrap();
            for (user_id, score, created_at) in
                [(c, 2, late), (b, 2, late), (a, 2, early), (b, 0, late)]
            {
                // One row per pair; bob plays quizzes 5 and 6.
                let quiz_id = if score == 0 { 6 } else { 5 };
                inner.scores.push(ScoreRec {
                    user_id,
                    quiz_id,
                    score,
                    correct_count: score,
                    created_at,
                });
            }
        }

        let board = store.leaderboard(5).await.unwrap();
        let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();
        // ann first (earlier timestamp), then bob before cid (lower id).
        assert_eq!(names, vec!["ann", "bob", "cid"]);
    }
}
