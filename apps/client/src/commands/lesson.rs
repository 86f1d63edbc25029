//! Lesson session commands.

use crate::api::ProgressUpdate;
use crate::state::AppState;
use chrono::Utc;
use lesson_core::{
    Answer, Evaluation, Exercise, Gender, LessonDocument, LessonSession, LessonSummary,
    PreReviewChoice, Stage,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::CommandError;

/// Snapshot of the loaded session for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub lesson_id: String,
    pub title: String,
    pub stage: Stage,
    pub gender: Gender,
    pub current_index: usize,
    pub total: usize,
}

impl SessionView {
    fn of(session: &LessonSession) -> Self {
        Self {
            lesson_id: session.lesson_id().to_string(),
            title: session.title().to_string(),
            stage: session.stage(),
            gender: session.gender(),
            current_index: session.current_index(),
            total: session.exercises().len(),
        }
    }
}

/// The exercise on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseView {
    pub index: usize,
    pub total: usize,
    pub gender: Gender,
    pub exercise: Exercise,
    /// Text the audio cue speaks, resolved for `gender`.
    pub audio_text: Option<String>,
}

/// Where the lesson result ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    /// The API was unreachable or no user is configured.
    SavedLocally,
}

impl SaveOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Saved => "Progress saved",
            Self::SavedLocally => "Progress saved locally",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishedLesson {
    pub summary: LessonSummary,
    pub save: SaveOutcome,
}

fn with_session<T>(
    state: &AppState,
    f: impl FnOnce(&mut LessonSession) -> Result<T, CommandError>,
) -> Result<T, CommandError> {
    let mut guard = state.session.lock()?;
    let session = guard
        .as_mut()
        .ok_or_else(|| CommandError::new("No lesson loaded"))?;
    f(session)
}

/// Fetch a lesson by id and open a session on it.
pub async fn load_lesson(state: &AppState, lesson_id: &str) -> Result<SessionView, CommandError> {
    let document = state.api.get_lesson(lesson_id).await?;
    open_lesson(state, document).await
}

/// Open a session on an already loaded lesson document.
///
/// The due-review count decides whether the session opens on `pre-review`.
pub async fn open_lesson(
    state: &AppState,
    document: LessonDocument,
) -> Result<SessionView, CommandError> {
    let unsupported = document
        .exercises
        .iter()
        .filter(|e| !e.is_supported())
        .count();
    if unsupported > 0 {
        warn!(
            lesson_id = %document.id,
            unsupported,
            "lesson has exercises that cannot be rendered"
        );
    }

    let due_reviews = due_review_count(state).await;
    let mut session = LessonSession::new(document, due_reviews)
        .with_comparison_mode(state.config.comparison_mode);
    session.set_gender(state.preferred_gender)?;

    info!(
        run_id = %state.run_id,
        lesson_id = session.lesson_id(),
        stage = %session.stage(),
        due_reviews,
        "lesson loaded"
    );
    let view = SessionView::of(&session);
    *state.session.lock()? = Some(session);
    Ok(view)
}

async fn due_review_count(state: &AppState) -> usize {
    let Some(user_id) = state.config.user_id.as_deref() else {
        debug!("no user id configured, skipping pre-review");
        return 0;
    };
    match state
        .api
        .get_due_reviews(user_id, state.config.review_limit)
        .await
    {
        Ok(cards) => cards.len(),
        Err(e) => {
            warn!(error = %e, "could not fetch due reviews, skipping pre-review");
            0
        }
    }
}

pub fn session_view(state: &AppState) -> Result<SessionView, CommandError> {
    with_session(state, |session| Ok(SessionView::of(session)))
}

/// Leave `pre-review`. Renderers run the review flow first for `ReviewNow`.
pub fn leave_pre_review(state: &AppState, choice: PreReviewChoice) -> Result<Stage, CommandError> {
    with_session(state, |session| {
        let stage = session.leave_pre_review(choice)?;
        debug!(?choice, %stage, "left pre-review");
        Ok(stage)
    })
}

pub fn set_gender(state: &AppState, gender: Gender) -> Result<(), CommandError> {
    with_session(state, |session| {
        session.set_gender(gender)?;
        debug!(%gender, "gender preference changed");
        Ok(())
    })
}

pub fn start_lesson(state: &AppState) -> Result<Stage, CommandError> {
    with_session(state, |session| {
        let stage = session.start(Utc::now())?;
        info!(lesson_id = session.lesson_id(), "lesson started");
        Ok(stage)
    })
}

/// The current exercise, or `None` outside the lesson stage.
pub fn current_exercise(state: &AppState) -> Result<Option<ExerciseView>, CommandError> {
    with_session(state, |session| {
        let gender = session.gender();
        Ok(session.current_exercise().map(|exercise| ExerciseView {
            index: session.current_index(),
            total: session.exercises().len(),
            gender,
            audio_text: exercise.audio_text(gender).map(str::to_string),
            exercise: exercise.clone(),
        }))
    })
}

pub fn submit_answer(state: &AppState, answer: &Answer) -> Result<Evaluation, CommandError> {
    with_session(state, |session| {
        let evaluation = session.submit(answer)?;
        debug!(
            index = session.current_index(),
            correct = evaluation.is_correct,
            "answer graded"
        );
        Ok(evaluation)
    })
}

pub fn advance(state: &AppState) -> Result<Stage, CommandError> {
    with_session(state, |session| {
        let stage = session.advance()?;
        if stage == Stage::Complete {
            info!(lesson_id = session.lesson_id(), "lesson complete");
        }
        Ok(stage)
    })
}

pub fn skip_exercise(state: &AppState) -> Result<Stage, CommandError> {
    with_session(state, |session| {
        debug!(index = session.current_index(), "exercise skipped");
        Ok(session.skip()?)
    })
}

/// Leave the completion screen and save progress.
///
/// A failed save never blocks the transition; it is reported as
/// [`SaveOutcome::SavedLocally`].
pub async fn finish_lesson(state: &AppState) -> Result<FinishedLesson, CommandError> {
    let summary = with_session(state, |session| Ok(session.finish(Utc::now())?))?;
    let save = save_progress(state, &summary).await;
    Ok(FinishedLesson { summary, save })
}

async fn save_progress(state: &AppState, summary: &LessonSummary) -> SaveOutcome {
    let Some(user_id) = state.config.user_id.clone() else {
        warn!(lesson_id = %summary.lesson_id, "no user id configured, progress not sent");
        return SaveOutcome::SavedLocally;
    };
    let update = ProgressUpdate {
        user_id,
        progress: 100,
        is_completed: true,
        score: summary.score,
    };
    match state.api.save_progress(&summary.lesson_id, &update).await {
        Ok(()) => {
            info!(lesson_id = %summary.lesson_id, score = summary.score, "progress saved");
            SaveOutcome::Saved
        }
        Err(e) => {
            warn!(lesson_id = %summary.lesson_id, error = %e, "progress save failed");
            SaveOutcome::SavedLocally
        }
    }
}
