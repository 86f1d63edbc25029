//! Error types for lesson-core.

use crate::exercise::ExerciseKind;
use crate::session::Stage;
use thiserror::Error;

/// Errors raised by the lesson session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} during stage {stage}")]
    InvalidTransition { stage: Stage, action: &'static str },

    #[error("no current exercise")]
    NoCurrentExercise,

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Errors raised while grading an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("exercise type {kind} has no evaluator")]
    Unsupported { kind: String },

    #[error("{answer} answer does not fit a {kind} exercise")]
    AnswerShape {
        kind: ExerciseKind,
        answer: &'static str,
    },

    #[error("match pair {left} / {right} is already used")]
    AlreadyMatched { left: String, right: String },
}

/// Errors raised by the spaced-repetition review flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("review queue is exhausted")]
    Exhausted,

    #[error("invalid review quality: {0}")]
    InvalidQuality(u8),

    #[error("card {expected} is due, not {given}")]
    WrongCard { expected: String, given: String },
}

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;
