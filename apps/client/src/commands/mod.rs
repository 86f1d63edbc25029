//! Operations exposed to renderers.
//!
//! Every command takes the shared [`AppState`](crate::state::AppState) and
//! returns a serializable result or a [`CommandError`].

pub mod lesson;
pub mod review;

use crate::api::ApiError;
use crate::audio::AudioError;
use crate::config::ConfigError;
use lesson_core::{EvaluationError, ReviewError, SessionError};
use std::fmt;
use std::sync::PoisonError;

pub use lesson::{
    advance, current_exercise, finish_lesson, leave_pre_review, load_lesson, open_lesson,
    session_view, set_gender, skip_exercise, start_lesson, submit_answer, ExerciseView,
    FinishedLesson, SaveOutcome, SessionView,
};
pub use review::{current_card, load_review, rate_card, RatedView, ReviewView};

/// Command error type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<EvaluationError> for CommandError {
    fn from(e: EvaluationError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ReviewError> for CommandError {
    fn from(e: ReviewError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ApiError> for CommandError {
    fn from(e: ApiError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<AudioError> for CommandError {
    fn from(e: AudioError) -> Self {
        Self::new(e.to_string())
    }
}

impl<T> From<PoisonError<T>> for CommandError {
    fn from(_: PoisonError<T>) -> Self {
        Self::new("State lock poisoned")
    }
}
