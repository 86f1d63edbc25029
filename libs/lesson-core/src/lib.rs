//! Lesson session engine shared by every client renderer.
//!
//! Provides:
//! - Gender-variant content resolution
//! - Exercise and lesson document types
//! - Hebrew answer comparison (strict or niqqud-insensitive)
//! - Per-exercise answer evaluation
//! - The lesson stage state machine
//! - The spaced-repetition review queue

pub mod error;
pub mod evaluate;
pub mod exercise;
pub mod gender;
pub mod matching;
pub mod review;
pub mod session;

pub use error::{EvaluationError, Result, ReviewError, SessionError};
pub use evaluate::{evaluate, Answer, Evaluation, MatchBoard};
pub use exercise::{Exercise, ExerciseKind, ExercisePayload, LessonDocument, Text};
pub use gender::{resolve, resolve_array, Gender, Gendered};
pub use matching::{compare_answers, compare_hebrew_text, ComparisonMode, MatchResult};
pub use review::{Rated, ReviewCard, ReviewQuality, ReviewQueue, ReviewSummary};
pub use session::{ExerciseOutcome, LessonSession, LessonSummary, PreReviewChoice, Stage};
