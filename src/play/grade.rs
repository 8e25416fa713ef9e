// src/play/grade.rs

use std::collections::{BTreeSet, HashMap};

use crate::error::AppError;
use crate::models::score::SubmittedAnswer;

/// The ground truth for one quiz: the set of correct option ids per question.
///
/// Every question of the quiz appears in the key, including any that ended up
/// without a correct option, so that submissions referencing foreign questions
/// can be told apart from merely wrong ones.
#[derive(Debug, Clone, Default)]
pub struct AnswerKey {
    correct: HashMap<i64, BTreeSet<i64>>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a question with no correct options yet.
    pub fn add_question(&mut self, question_id: i64) {
        self.correct.entry(question_id).or_default();
    }

    pub fn add_correct_option(&mut self, question_id: i64, option_id: i64) {
        self.correct.entry(question_id).or_default().insert(option_id);
    }

    /// Number of questions in the quiz. This is the grading `total`,
    /// independent of how many questions were answered.
    pub fn question_count(&self) -> usize {
        self.correct.len()
    }

    pub fn contains_question(&self, question_id: i64) -> bool {
        self.correct.contains_key(&question_id)
    }

    fn correct_set(&self, question_id: i64) -> Option<&BTreeSet<i64>> {
        self.correct.get(&question_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeOutcome {
    pub score: i64,
    pub correct_count: i64,
    pub total: i64,
}

/// Scores a submission against the quiz's answer key.
///
/// A question counts as correct iff the set of submitted option ids equals the
/// set of correct option ids exactly. For `multi` questions that means
/// all-or-nothing: partial overlap scores zero. Unanswered questions score
/// zero but still count towards `total`.
///
/// Fails with `InvalidInput` if the submission is empty or references a
/// question that does not belong to the quiz.
pub fn grade(key: &AnswerKey, answers: &[SubmittedAnswer]) -> Result<GradeOutcome, AppError> {
    if answers.is_empty() {
        return Err(AppError::InvalidInput("empty submission".to_string()));
    }

    let mut selected: HashMap<i64, BTreeSet<i64>> = HashMap::new();
    for answer in answers {
        if !key.contains_question(answer.question_id) {
            return Err(AppError::InvalidInput(format!(
                "question {} does not belong to this quiz",
                answer.question_id
            )));
        }
        selected
            .entry(answer.question_id)
            .or_default()
            .insert(answer.option_id);
    }

    let correct_count = selected
        .iter()
        .filter(|(question_id, picked)| key.correct_set(**question_id) == Some(*picked))
        .count() as i64;

    Ok(GradeOutcome {
        // One point per fully correct question.
        score: correct_count,
        correct_count,
        total: key.question_count() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_id: i64, option_id: i64) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            option_id,
        }
    }

    fn multi_key() -> AnswerKey {
        // One multi question (id 1) with correct set {10, 11}.
        let mut key = AnswerKey::new();
        key.add_correct_option(1, 10);
        key.add_correct_option(1, 11);
        key
    }

    #[test]
    fn multi_choice_partial_overlap_scores_zero() {
        let key = multi_key();
        let outcome = grade(&key, &[answer(1, 10)]).unwrap();
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn multi_choice_exact_set_scores_one() {
        let key = multi_key();
        let outcome = grade(&key, &[answer(1, 10), answer(1, 11)]).unwrap();
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total, 1);
    }

    #[test]
    fn multi_choice_superset_scores_zero() {
        let key = multi_key();
        let outcome = grade(&key, &[answer(1, 10), answer(1, 11), answer(1, 12)]).unwrap();
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn all_single_answers_correct_round_trip() {
        let mut key = AnswerKey::new();
        key.add_correct_option(1, 10);
        key.add_correct_option(2, 20);
        key.add_correct_option(3, 30);

        let outcome = grade(&key, &[answer(1, 10), answer(2, 20), answer(3, 30)]).unwrap();
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.correct_count, 3);
        assert_eq!(outcome.total, 3);
    }

    #[test]
    fn total_counts_unanswered_questions() {
        let mut key = AnswerKey::new();
        key.add_correct_option(1, 10);
        key.add_correct_option(2, 20);
        key.add_question(3);
        key.add_correct_option(3, 30);

        let outcome = grade(&key, &[answer(1, 10)]).unwrap();
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total, 3);
    }

    #[test]
    fn empty_submission_is_invalid() {
        let key = multi_key();
        assert!(matches!(
            grade(&key, &[]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn foreign_question_is_invalid() {
        let key = multi_key();
        assert!(matches!(
            grade(&key, &[answer(99, 1)]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn duplicate_pairs_collapse_into_a_set() {
        let key = multi_key();
        let outcome = grade(
            &key,
            &[answer(1, 10), answer(1, 10), answer(1, 11)],
        )
        .unwrap();
        assert_eq!(outcome.score, 1);
    }
}
