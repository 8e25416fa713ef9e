// src/store/pg.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;
use crate::models::quiz::{NewQuizData, PlayOption, PlayQuestion, Quiz, QuizMeta, QuizSnapshot};
use crate::models::score::LeaderboardEntry;
use crate::models::session::{SessionMeta, SessionOverview};
use crate::models::user::User;
use crate::play::AnswerKey;
use crate::store::Store;

/// Postgres-backed store. Owns nothing but the pool handle; the pool's
/// lifecycle belongs to the process entry point.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    text: String,
    kind: String,
    time_limit_secs: i32,
}

#[derive(FromRow)]
struct OptionRow {
    id: i64,
    question_id: i64,
    text: String,
}

#[derive(FromRow)]
struct CorrectOptionRow {
    question_id: i64,
    option_id: i64,
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            RETURNING id, username, password, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_quiz(&self, author_id: i64, quiz: &NewQuizData) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let quiz_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (title, description, category, access, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.category)
        .bind(&quiz.access)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        for (position, question) in quiz.questions.iter().enumerate() {
            let question_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO questions (quiz_id, text, kind, time_limit_secs, position)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(quiz_id)
            .bind(&question.text)
            .bind(question.kind.as_str())
            .bind(question.time_limit_secs)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;

            for option in &question.options {
                sqlx::query(
                    "INSERT INTO answers (question_id, text, is_correct) VALUES ($1, $2, $3)",
                )
                .bind(question_id)
                .bind(&option.text)
                .bind(option.is_correct)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(quiz_id)
    }

    async fn list_quizzes_for(&self, viewer_id: i64) -> Result<Vec<Quiz>, AppError> {
        let quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, description, category, access, author_id, created_at, updated_at
            FROM quizzes
            WHERE access = 'public' OR author_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    async fn quiz_author(&self, quiz_id: i64) -> Result<Option<i64>, AppError> {
        let author = sqlx::query_scalar::<_, i64>("SELECT author_id FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(author)
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), AppError> {
        // Questions, options, sessions and ledger rows go with it (CASCADE).
        sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_session(
        &self,
        quiz_id: i64,
        owner_id: i64,
        code: &str,
    ) -> Result<i64, AppError> {
        let session_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sessions (code, quiz_id, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(code)
        .bind(quiz_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("join code '{code}' is already in use"))
            }
            other => other,
        })?;

        Ok(session_id)
    }

    async fn session_by_code(&self, code: &str) -> Result<Option<SessionMeta>, AppError> {
        let session = sqlx::query_as::<_, SessionMeta>(
            r#"
            SELECT s.id, s.code, s.quiz_id, s.owner_id, q.author_id AS quiz_author_id
            FROM sessions s
            JOIN quizzes q ON s.quiz_id = q.id
            WHERE s.code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionOverview>, AppError> {
        let sessions = sqlx::query_as::<_, SessionOverview>(
            r#"
            SELECT
                s.id AS session_id,
                s.code,
                q.title,
                q.category,
                q.description,
                q.access,
                u.username AS host,
                s.created_at
            FROM sessions s
            JOIN quizzes q ON s.quiz_id = q.id
            JOIN users u ON s.owner_id = u.id
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn delete_session(&self, session_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn quiz_snapshot(&self, quiz_id: i64) -> Result<QuizSnapshot, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, description, category, access, author_id, created_at, updated_at
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("quiz not found".to_string()))?;

        let question_rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, text, kind, time_limit_secs
            FROM questions
            WHERE quiz_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<i64> = question_rows.iter().map(|q| q.id).collect();

        let option_rows = sqlx::query_as::<_, OptionRow>(
            r#"
            SELECT id, question_id, text
            FROM answers
            WHERE question_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let questions = question_rows
            .into_iter()
            .map(|row| {
                Ok(PlayQuestion {
                    id: row.id,
                    text: row.text,
                    kind: row.kind.parse()?,
                    time_limit_secs: row.time_limit_secs,
                    options: option_rows
                        .iter()
                        .filter(|o| o.question_id == row.id)
                        .map(|o| PlayOption {
                            id: o.id,
                            text: o.text.clone(),
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(QuizSnapshot {
            quiz: QuizMeta {
                id: quiz.id,
                title: quiz.title,
                description: quiz.description,
            },
            questions,
        })
    }

    async fn answer_key(&self, quiz_id: i64) -> Result<AnswerKey, AppError> {
        let question_ids =
            sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE quiz_id = $1")
                .bind(quiz_id)
                .fetch_all(&self.pool)
                .await?;

        let correct = sqlx::query_as::<_, CorrectOptionRow>(
            r#"
            SELECT a.question_id, a.id AS option_id
            FROM answers a
            JOIN questions q ON a.question_id = q.id
            WHERE q.quiz_id = $1 AND a.is_correct
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut key = AnswerKey::new();
        for question_id in question_ids {
            key.add_question(question_id);
        }
        for row in correct {
            key.add_correct_option(row.question_id, row.option_id);
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
        // Single atomic upsert on the (user_id, quiz_id) constraint: concurrent
        // submissions for the same pair serialize on the row, the later commit
        // wins, and no duplicate row can exist.
        sqlx::query(
            r#"
            INSERT INTO scores (user_id, quiz_id, score, correct_count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, quiz_id) DO UPDATE SET
                score = EXCLUDED.score,
                correct_count = EXCLUDED.correct_count,
                created_at = now()
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .bind(score)
        .bind(correct_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn leaderboard(&self, quiz_id: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT u.username, s.score, s.created_at
            FROM scores s
            JOIN users u ON s.user_id = u.id
            WHERE s.quiz_id = $1
            ORDER BY s.score DESC, s.created_at ASC, s.user_id ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
