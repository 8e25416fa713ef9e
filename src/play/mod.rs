// src/play/mod.rs

pub mod grade;
pub mod turn;

pub use grade::{AnswerKey, GradeOutcome, grade};
pub use turn::{TurnClock, TurnQuestion, TurnState};
