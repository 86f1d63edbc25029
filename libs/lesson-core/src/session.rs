//! Lesson session state machine.
//!
//! ```text
//! pre-review -> intro -> lesson(0..n) -> complete -> post-options
//! ```
//!
//! `pre-review` is skipped when no review words are due. The session only
//! moves forward; nothing is persisted here and a torn-down session cannot be
//! resumed.

use crate::error::{Result, SessionError};
use crate::evaluate::{evaluate, Answer, Evaluation};
use crate::exercise::{Exercise, ExercisePayload, LessonDocument};
use crate::gender::Gender;
use crate::matching::ComparisonMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Phase of a lesson session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    PreReview,
    Intro,
    Lesson,
    Complete,
    PostOptions,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreReview => "pre-review",
            Self::Intro => "intro",
            Self::Lesson => "lesson",
            Self::Complete => "complete",
            Self::PostOptions => "post-options",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the learner leaves the pre-review stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreReviewChoice {
    Skip,
    ReviewNow,
}

/// What happened to one exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseOutcome {
    Correct,
    Incorrect,
    /// Completed without grading (introductions, self-assessed practice).
    Seen,
    Skipped,
}

/// Result reported when the learner leaves the completion screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub lesson_id: String,
    /// Elapsed time in rounded minutes (half rounds away from zero).
    pub time_spent_minutes: u32,
    pub completed_vocabulary: Vec<String>,
    /// Percentage of graded exercises answered correctly on first try.
    pub score: u32,
    pub correct: usize,
    pub graded: usize,
    pub skipped: usize,
}

/// One learner's pass through a lesson.
#[derive(Debug, Clone)]
pub struct LessonSession {
    lesson_id: String,
    title: String,
    exercises: Vec<Exercise>,
    current_index: usize,
    stage: Stage,
    gender: Gender,
    mode: ComparisonMode,
    started_at: Option<DateTime<Utc>>,
    completed_vocabulary: Vec<String>,
    outcomes: Vec<Option<ExerciseOutcome>>,
}

impl LessonSession {
    /// Create a session. It opens on `pre-review` only if reviews are due.
    pub fn new(lesson: LessonDocument, due_reviews: usize) -> Self {
        let stage = if due_reviews > 0 {
            Stage::PreReview
        } else {
            Stage::Intro
        };
        let outcomes = vec![None; lesson.exercises.len()];
        Self {
            lesson_id: lesson.id,
            title: lesson.title,
            exercises: lesson.exercises,
            current_index: 0,
            stage,
            gender: Gender::default(),
            mode: ComparisonMode::default(),
            started_at: None,
            completed_vocabulary: Vec::new(),
            outcomes,
        }
    }

    pub fn with_comparison_mode(mut self, mode: ComparisonMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn comparison_mode(&self) -> ComparisonMode {
        self.mode
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Resolved Hebrew of every vocabulary item introduced so far, in order.
    pub fn completed_vocabulary(&self) -> &[String] {
        &self.completed_vocabulary
    }

    pub fn outcome(&self, index: usize) -> Option<ExerciseOutcome> {
        self.outcomes.get(index).copied().flatten()
    }

    /// The exercise on screen. Only defined during the lesson stage.
    pub fn current_exercise(&self) -> Option<&Exercise> {
        match self.stage {
            Stage::Lesson => self.exercises.get(self.current_index),
            _ => None,
        }
    }

    /// Leave `pre-review` for `intro`, either skipping or after reviewing.
    pub fn leave_pre_review(&mut self, _choice: PreReviewChoice) -> Result<Stage> {
        self.expect_stage(Stage::PreReview, "leave pre-review")?;
        self.stage = Stage::Intro;
        Ok(self.stage)
    }

    /// Change the gender preference. Locked once the lesson has started.
    pub fn set_gender(&mut self, gender: Gender) -> Result<()> {
        match self.stage {
            Stage::PreReview | Stage::Intro => {
                self.gender = gender;
                Ok(())
            }
            stage => Err(SessionError::InvalidTransition {
                stage,
                action: "change gender",
            }),
        }
    }

    /// Start the lesson, recording the start time.
    ///
    /// A lesson without exercises goes straight to `complete`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Stage> {
        self.expect_stage(Stage::Intro, "start lesson")?;
        self.started_at = Some(now);
        self.current_index = 0;
        self.stage = if self.exercises.is_empty() {
            Stage::Complete
        } else {
            Stage::Lesson
        };
        Ok(self.stage)
    }

    /// Grade an answer for the current exercise.
    ///
    /// Only the first graded attempt counts toward the score; later attempts
    /// are still evaluated for feedback.
    pub fn submit(&mut self, answer: &Answer) -> Result<Evaluation> {
        self.expect_stage(Stage::Lesson, "submit an answer")?;
        let exercise = self
            .exercises
            .get(self.current_index)
            .ok_or(SessionError::NoCurrentExercise)?;
        let evaluation = evaluate(exercise, answer, self.gender, self.mode)?;

        let graded = exercise.kind().map(|k| k.is_graded()).unwrap_or(false);
        let slot = &mut self.outcomes[self.current_index];
        if graded && slot.is_none() {
            *slot = Some(if evaluation.is_correct {
                ExerciseOutcome::Correct
            } else {
                ExerciseOutcome::Incorrect
            });
        }
        Ok(evaluation)
    }

    /// Finish the current exercise and move to the next one.
    ///
    /// A completed vocabulary introduction adds its resolved Hebrew to the
    /// completed vocabulary unless the same word is already there.
    pub fn advance(&mut self) -> Result<Stage> {
        self.expect_stage(Stage::Lesson, "advance")?;

        let introduced = match self.exercises.get(self.current_index).map(|e| &e.payload) {
            Some(ExercisePayload::VocabularyIntro(item)) => {
                Some(item.hebrew.resolve(self.gender).clone())
            }
            _ => None,
        };
        if let Some(word) = introduced {
            if !self.completed_vocabulary.contains(&word) {
                self.completed_vocabulary.push(word);
            }
        }
        self.step(ExerciseOutcome::Seen)
    }

    /// Move past the current exercise without completing it.
    ///
    /// This is how the learner gets past exercises that cannot be rendered.
    pub fn skip(&mut self) -> Result<Stage> {
        self.expect_stage(Stage::Lesson, "skip")?;
        self.step(ExerciseOutcome::Skipped)
    }

    /// Leave the completion screen and report the lesson summary.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<LessonSummary> {
        self.expect_stage(Stage::Complete, "continue")?;
        self.stage = Stage::PostOptions;
        Ok(self.summary(now))
    }

    /// Summary of the session as of `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> LessonSummary {
        let count = |wanted: ExerciseOutcome| {
            self.outcomes
                .iter()
                .filter(|o| **o == Some(wanted))
                .count()
        };
        let correct = count(ExerciseOutcome::Correct);
        let graded = correct + count(ExerciseOutcome::Incorrect);

        LessonSummary {
            lesson_id: self.lesson_id.clone(),
            time_spent_minutes: self.minutes_since_start(now),
            completed_vocabulary: self.completed_vocabulary.clone(),
            score: score(correct, graded),
            correct,
            graded,
            skipped: count(ExerciseOutcome::Skipped),
        }
    }

    fn minutes_since_start(&self, now: DateTime<Utc>) -> u32 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let elapsed_ms = (now - started_at).num_milliseconds().max(0);
        (elapsed_ms as f64 / MILLIS_PER_MINUTE).round() as u32
    }

    fn step(&mut self, outcome: ExerciseOutcome) -> Result<Stage> {
        if let Some(slot) = self.outcomes.get_mut(self.current_index) {
            slot.get_or_insert(outcome);
        }
        self.current_index += 1;
        if self.current_index >= self.exercises.len() {
            self.stage = Stage::Complete;
        }
        Ok(self.stage)
    }

    fn expect_stage(&self, expected: Stage, action: &'static str) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                stage: self.stage,
                action,
            })
        }
    }
}

fn score(correct: usize, graded: usize) -> u32 {
    if graded == 0 {
        return 100;
    }
    (correct as f64 * 100.0 / graded as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{FillInBlank, VocabularyIntro};
    use crate::gender::Gendered;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn vocab(id: &str, hebrew: Gendered<String>) -> Exercise {
        Exercise::new(
            id,
            ExercisePayload::VocabularyIntro(VocabularyIntro {
                hebrew,
                english: "word".to_string(),
                transliteration: None,
                category: None,
            }),
        )
    }

    fn fill(id: &str, answer: &str) -> Exercise {
        Exercise::new(
            id,
            ExercisePayload::FillInBlank(FillInBlank {
                sentence: "___".into(),
                correct_answer: answer.into(),
                translation: None,
                hint: None,
            }),
        )
    }

    fn lesson(exercises: Vec<Exercise>) -> LessonDocument {
        LessonDocument {
            id: "lesson-1".to_string(),
            title: "Test".to_string(),
            description: None,
            exercises,
        }
    }

    #[test]
    fn opens_on_pre_review_only_when_reviews_due() {
        assert_eq!(LessonSession::new(lesson(vec![]), 3).stage(), Stage::PreReview);
        assert_eq!(LessonSession::new(lesson(vec![]), 0).stage(), Stage::Intro);
    }

    #[test]
    fn pre_review_leads_to_intro_and_is_not_revisited() {
        let mut session = LessonSession::new(lesson(vec![fill("a", "מַיִם")]), 2);
        assert_eq!(session.leave_pre_review(PreReviewChoice::ReviewNow), Ok(Stage::Intro));
        assert_eq!(
            session.leave_pre_review(PreReviewChoice::Skip),
            Err(SessionError::InvalidTransition {
                stage: Stage::Intro,
                action: "leave pre-review",
            })
        );
    }

    #[test]
    fn advance_visits_every_index_once() {
        let exercises: Vec<Exercise> = (0..4).map(|i| fill(&i.to_string(), "x")).collect();
        let mut session = LessonSession::new(lesson(exercises), 0);
        session.start(Utc::now()).unwrap();

        let mut visited = Vec::new();
        while session.stage() == Stage::Lesson {
            visited.push(session.current_index());
            session.advance().unwrap();
        }
        assert_eq!(visited, vec![0, 1, 2, 3]);
        assert_eq!(session.stage(), Stage::Complete);
        assert!(session.current_exercise().is_none());
        assert!(session.advance().is_err());
    }

    #[test]
    fn empty_lesson_completes_on_start() {
        let mut session = LessonSession::new(lesson(vec![]), 0);
        assert_eq!(session.start(Utc::now()), Ok(Stage::Complete));
    }

    #[test]
    fn duplicate_vocabulary_counted_once() {
        let mut session = LessonSession::new(
            lesson(vec![
                vocab("a", "קָפֶה".into()),
                vocab("b", Gendered::pair("קָפֶה", "תֵּה")),
                vocab("c", "מַיִם".into()),
            ]),
            0,
        );
        session.start(Utc::now()).unwrap();
        for _ in 0..3 {
            session.advance().unwrap();
        }
        assert_eq!(
            session.completed_vocabulary(),
            &["קָפֶה".to_string(), "מַיִם".to_string()]
        );
    }

    #[test]
    fn vocabulary_resolved_under_gender() {
        let word = vocab("a", Gendered::pair("תַּלְמִיד", "תַּלְמִידָה"));
        let mut session = LessonSession::new(lesson(vec![word]), 0);
        session.set_gender(Gender::Female).unwrap();
        session.start(Utc::now()).unwrap();
        session.advance().unwrap();
        assert_eq!(session.completed_vocabulary(), &["תַּלְמִידָה".to_string()]);
    }

    #[test]
    fn skipped_vocabulary_is_not_completed() {
        let mut session = LessonSession::new(lesson(vec![vocab("a", "קָפֶה".into())]), 0);
        session.start(Utc::now()).unwrap();
        session.skip().unwrap();
        assert!(session.completed_vocabulary().is_empty());
        assert_eq!(session.outcome(0), Some(ExerciseOutcome::Skipped));
    }

    #[test]
    fn gender_locked_after_start() {
        let mut session = LessonSession::new(lesson(vec![fill("a", "x")]), 0);
        session.start(Utc::now()).unwrap();
        assert!(matches!(
            session.set_gender(Gender::Female),
            Err(SessionError::InvalidTransition { stage: Stage::Lesson, .. })
        ));
        assert_eq!(session.gender(), Gender::Male);
    }

    #[test]
    fn first_graded_attempt_sets_score() {
        let mut session =
            LessonSession::new(lesson(vec![fill("a", "מַיִם"), fill("b", "לֶחֶם")]), 0);
        session.start(Utc::now()).unwrap();

        assert!(!session.submit(&Answer::Text("חלב".into())).unwrap().is_correct);
        assert!(session.submit(&Answer::Text("מים".into())).unwrap().is_correct);
        assert_eq!(session.outcome(0), Some(ExerciseOutcome::Incorrect));
        session.advance().unwrap();

        assert!(session.submit(&Answer::Text("לחם".into())).unwrap().is_correct);
        session.advance().unwrap();

        let summary = session.finish(Utc::now()).unwrap();
        assert_eq!(summary.graded, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.score, 50);
        assert_eq!(session.stage(), Stage::PostOptions);
    }

    #[test]
    fn time_spent_is_rounded_minutes() {
        let start = Utc::now();
        let mut session = LessonSession::new(lesson(vec![fill("a", "x")]), 0);
        session.start(start).unwrap();
        session.advance().unwrap();

        assert_eq!(session.summary(start + Duration::seconds(89)).time_spent_minutes, 1);
        assert_eq!(session.summary(start + Duration::seconds(90)).time_spent_minutes, 2);
        assert_eq!(session.summary(start - Duration::seconds(30)).time_spent_minutes, 0);

        let summary = session.finish(start + Duration::minutes(7)).unwrap();
        assert_eq!(summary.time_spent_minutes, 7);
        assert!(session.finish(start).is_err());
    }

    #[test]
    fn score_without_graded_exercises_is_full() {
        assert_eq!(score(0, 0), 100);
        assert_eq!(score(2, 3), 67);
    }
}
