// src/play/turn.rs

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;
use crate::models::quiz::{QuestionKind, QuizSnapshot};
use crate::models::score::SubmittedAnswer;

/// One question as seen by the turn clock.
#[derive(Debug, Clone)]
pub struct TurnQuestion {
    pub id: i64,
    pub kind: QuestionKind,
    pub time_limit: Duration,
}

/// Where the player currently is in the question sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingAnswer {
        index: usize,
        deadline: DateTime<Utc>,
    },
    /// Terminal. Reaching it hands the collected submission to grading
    /// exactly once.
    Completed,
}

/// Per-question countdown state machine driving one play-through.
///
/// The server holds no timer: deadlines here are advisory and the machine is
/// driven by whoever renders the quiz (see `tick`). Selections for the current
/// question may be revised freely until `advance` fires; a question left with
/// no selection simply grades as wrong.
#[derive(Debug, Clone)]
pub struct TurnClock {
    questions: Vec<TurnQuestion>,
    state: TurnState,
    selections: HashMap<i64, BTreeSet<i64>>,
}

impl TurnClock {
    /// Starts the clock on the first question. Fails with `InvalidState` for
    /// an empty question list: a quiz needs at least one question to be
    /// playable.
    pub fn start(questions: Vec<TurnQuestion>, now: DateTime<Utc>) -> Result<Self, AppError> {
        let first = questions.first().ok_or_else(|| {
            AppError::InvalidState("quiz has no questions".to_string())
        })?;
        let state = TurnState::AwaitingAnswer {
            index: 0,
            deadline: now + first.time_limit,
        };
        Ok(Self {
            questions,
            state,
            selections: HashMap::new(),
        })
    }

    /// Starts the clock from a player-facing quiz snapshot.
    pub fn for_snapshot(snapshot: &QuizSnapshot, now: DateTime<Utc>) -> Result<Self, AppError> {
        let questions = snapshot
            .questions
            .iter()
            .map(|q| TurnQuestion {
                id: q.id,
                kind: q.kind,
                time_limit: Duration::seconds(i64::from(q.time_limit_secs)),
            })
            .collect();
        Self::start(questions, now)
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, TurnState::Completed)
    }

    pub fn current_question(&self) -> Option<&TurnQuestion> {
        match self.state {
            TurnState::AwaitingAnswer { index, .. } => self.questions.get(index),
            TurnState::Completed => None,
        }
    }

    /// Records a selection for the current question.
    ///
    /// `single`/`boolean`: the new option replaces any prior selection.
    /// `multi`: selecting an already-selected option deselects it, otherwise
    /// it is added.
    pub fn select(&mut self, option_id: i64) -> Result<(), AppError> {
        let question = self.current_question().ok_or_else(|| {
            AppError::InvalidState("play-through already completed".to_string())
        })?;
        let (question_id, kind) = (question.id, question.kind);

        let picked = self.selections.entry(question_id).or_default();
        match kind {
            QuestionKind::Single | QuestionKind::Boolean => {
                picked.clear();
                picked.insert(option_id);
            }
            QuestionKind::Multi => {
                if !picked.remove(&option_id) {
                    picked.insert(option_id);
                }
            }
        }
        Ok(())
    }

    /// Advances past the deadline if it has expired. Returns whether the
    /// machine moved. Call this before `advance` so that expiry wins when
    /// both triggers race.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            TurnState::AwaitingAnswer { deadline, .. } if now >= deadline => {
                self.advance(now);
                true
            }
            _ => false,
        }
    }

    /// Moves to the next question, or to `Completed` after the last one.
    /// The next question's deadline starts counting from `now`.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        if let TurnState::AwaitingAnswer { index, .. } = self.state {
            let next = index + 1;
            self.state = match self.questions.get(next) {
                Some(question) => TurnState::AwaitingAnswer {
                    index: next,
                    deadline: now + question.time_limit,
                },
                None => TurnState::Completed,
            };
        }
    }

    /// Flattens the collected selections into the submission format the
    /// grading endpoint accepts, in question order. Questions without a
    /// selection are omitted (they grade as wrong by counting towards the
    /// total only).
    pub fn into_submission(self) -> Vec<SubmittedAnswer> {
        let mut answers = Vec::new();
        for question in &self.questions {
            if let Some(picked) = self.selections.get(&question.id) {
                answers.extend(picked.iter().map(|&option_id| SubmittedAnswer {
                    question_id: question.id,
                    option_id,
                }));
            }
        }
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, kind: QuestionKind, secs: i64) -> TurnQuestion {
        TurnQuestion {
            id,
            kind,
            time_limit: Duration::seconds(secs),
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-01-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn starts_on_first_question_with_its_deadline() {
        let clock = TurnClock::start(
            vec![
                question(1, QuestionKind::Single, 30),
                question(2, QuestionKind::Single, 60),
            ],
            now(),
        )
        .unwrap();

        assert_eq!(
            clock.state(),
            TurnState::AwaitingAnswer {
                index: 0,
                deadline: now() + Duration::seconds(30),
            }
        );
        assert_eq!(clock.current_question().unwrap().id, 1);
    }

    #[test]
    fn empty_quiz_is_not_playable() {
        assert!(matches!(
            TurnClock::start(vec![], now()),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn single_choice_reselection_replaces() {
        let mut clock =
            TurnClock::start(vec![question(1, QuestionKind::Single, 30)], now()).unwrap();
        clock.select(10).unwrap();
        clock.select(11).unwrap();
        clock.advance(now());

        assert_eq!(
            clock.into_submission(),
            vec![SubmittedAnswer {
                question_id: 1,
                option_id: 11
            }]
        );
    }

    #[test]
    fn multi_choice_selection_toggles() {
        let mut clock =
            TurnClock::start(vec![question(1, QuestionKind::Multi, 30)], now()).unwrap();
        clock.select(10).unwrap();
        clock.select(11).unwrap();
        clock.select(10).unwrap(); // deselect
        clock.advance(now());

        assert_eq!(
            clock.into_submission(),
            vec![SubmittedAnswer {
                question_id: 1,
                option_id: 11
            }]
        );
    }

    #[test]
    fn advance_walks_the_sequence_then_completes() {
        let mut clock = TurnClock::start(
            vec![
                question(1, QuestionKind::Single, 30),
                question(2, QuestionKind::Boolean, 30),
            ],
            now(),
        )
        .unwrap();

        clock.advance(now());
        assert_eq!(clock.current_question().unwrap().id, 2);

        clock.advance(now());
        assert!(clock.is_completed());

        // Terminal: further advances are no-ops and selections are refused.
        clock.advance(now());
        assert!(clock.is_completed());
        assert!(matches!(
            clock.select(1),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn tick_fires_only_at_or_after_the_deadline() {
        let mut clock = TurnClock::start(
            vec![
                question(1, QuestionKind::Single, 30),
                question(2, QuestionKind::Single, 45),
            ],
            now(),
        )
        .unwrap();

        assert!(!clock.tick(now() + Duration::seconds(29)));
        assert_eq!(clock.current_question().unwrap().id, 1);

        let expiry = now() + Duration::seconds(30);
        assert!(clock.tick(expiry));
        // Next deadline counts from the moment the clock advanced.
        assert_eq!(
            clock.state(),
            TurnState::AwaitingAnswer {
                index: 1,
                deadline: expiry + Duration::seconds(45),
            }
        );
    }

    #[test]
    fn unanswered_questions_are_omitted_from_the_submission() {
        let mut clock = TurnClock::start(
            vec![
                question(1, QuestionKind::Single, 30),
                question(2, QuestionKind::Single, 30),
            ],
            now(),
        )
        .unwrap();

        clock.advance(now()); // no selection for question 1
        clock.select(20).unwrap();
        clock.advance(now());
        assert!(clock.is_completed());

        assert_eq!(
            clock.into_submission(),
            vec![SubmittedAnswer {
                question_id: 2,
                option_id: 20
            }]
        );
    }
}
