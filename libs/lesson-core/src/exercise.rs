//! Lesson documents and exercise payloads.
//!
//! Exercises arrive as `{ "id", "type", "data" }`. Decoding never fails on a
//! single bad exercise: an unknown `type`, or a payload that does not match its
//! declared kind, becomes [`ExercisePayload::Unsupported`] so the session can
//! show a placeholder and let the learner skip it.

use crate::gender::{Gender, Gendered};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Text that may differ by learner gender.
pub type Text = Gendered<String>;

/// Exercise kinds with a renderer and evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    VocabularyIntro,
    ListenAndSelect,
    MatchPairs,
    BuildSentence,
    FillInBlank,
    SpeakingPractice,
    DialogueCompletion,
    DialogueWithBlanks,
    ListenAndType,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 9] = [
        Self::VocabularyIntro,
        Self::ListenAndSelect,
        Self::MatchPairs,
        Self::BuildSentence,
        Self::FillInBlank,
        Self::SpeakingPractice,
        Self::DialogueCompletion,
        Self::DialogueWithBlanks,
        Self::ListenAndType,
    ];

    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VocabularyIntro => "vocabulary_intro",
            Self::ListenAndSelect => "listen_and_select",
            Self::MatchPairs => "match_pairs",
            Self::BuildSentence => "build_sentence",
            Self::FillInBlank => "fill_in_blank",
            Self::SpeakingPractice => "speaking_practice",
            Self::DialogueCompletion => "dialogue_completion",
            Self::DialogueWithBlanks => "dialogue_with_blanks",
            Self::ListenAndType => "listen_and_type",
        }
    }

    /// Parse from the wire name.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyIntro {
    pub hebrew: Text,
    pub english: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenAndSelect {
    pub audio_text: Text,
    pub options: Vec<Text>,
    pub correct_answer: Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub hebrew: Text,
    pub english: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPairs {
    pub pairs: Vec<MatchPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSentence {
    pub words: Vec<Text>,
    pub correct_order: Vec<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInBlank {
    pub sentence: Text,
    pub correct_answer: Text,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakingPractice {
    pub phrase: Text,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    pub speaker: String,
    pub text: Text,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueCompletion {
    pub lines: Vec<DialogueLine>,
    pub options: Vec<Text>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueBlank {
    pub line_index: usize,
    pub correct_answer: Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueWithBlanks {
    pub lines: Vec<DialogueLine>,
    pub blanks: Vec<DialogueBlank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenAndType {
    pub audio_text: Text,
    pub correct_answer: Text,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// Kind-specific exercise content.
#[derive(Debug, Clone, PartialEq)]
pub enum ExercisePayload {
    VocabularyIntro(VocabularyIntro),
    ListenAndSelect(ListenAndSelect),
    MatchPairs(MatchPairs),
    BuildSentence(BuildSentence),
    FillInBlank(FillInBlank),
    SpeakingPractice(SpeakingPractice),
    DialogueCompletion(DialogueCompletion),
    DialogueWithBlanks(DialogueWithBlanks),
    ListenAndType(ListenAndType),
    /// No renderer/evaluator exists for this exercise. The original `type`
    /// and `data` are kept so the document re-serializes unchanged.
    Unsupported {
        kind: String,
        reason: String,
        data: Value,
    },
}

/// One step of a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawExercise", into = "RawExercise")]
pub struct Exercise {
    pub id: String,
    pub payload: ExercisePayload,
}

impl Exercise {
    pub fn new(id: impl Into<String>, payload: ExercisePayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// `None` for unsupported exercises.
    pub fn kind(&self) -> Option<ExerciseKind> {
        Some(match &self.payload {
            ExercisePayload::VocabularyIntro(_) => ExerciseKind::VocabularyIntro,
            ExercisePayload::ListenAndSelect(_) => ExerciseKind::ListenAndSelect,
            ExercisePayload::MatchPairs(_) => ExerciseKind::MatchPairs,
            ExercisePayload::BuildSentence(_) => ExerciseKind::BuildSentence,
            ExercisePayload::FillInBlank(_) => ExerciseKind::FillInBlank,
            ExercisePayload::SpeakingPractice(_) => ExerciseKind::SpeakingPractice,
            ExercisePayload::DialogueCompletion(_) => ExerciseKind::DialogueCompletion,
            ExercisePayload::DialogueWithBlanks(_) => ExerciseKind::DialogueWithBlanks,
            ExercisePayload::ListenAndType(_) => ExerciseKind::ListenAndType,
            ExercisePayload::Unsupported { .. } => return None,
        })
    }

    /// Wire name of the exercise type, including unknown ones.
    pub fn type_name(&self) -> &str {
        match &self.payload {
            ExercisePayload::Unsupported { kind, .. } => kind.as_str(),
            _ => self.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.kind().is_some()
    }

    /// Hebrew text spoken by the exercise's audio cue, if it has one.
    pub fn audio_text(&self, gender: Gender) -> Option<&str> {
        let text = match &self.payload {
            ExercisePayload::VocabularyIntro(v) => &v.hebrew,
            ExercisePayload::ListenAndSelect(v) => &v.audio_text,
            ExercisePayload::ListenAndType(v) => &v.audio_text,
            ExercisePayload::SpeakingPractice(v) => &v.phrase,
            _ => return None,
        };
        Some(text.resolve(gender).as_str())
    }
}

/// Wire shape of an exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawExercise {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

fn decode<T: serde::de::DeserializeOwned>(
    data: Value,
    wrap: fn(T) -> ExercisePayload,
    kind: &str,
) -> ExercisePayload {
    match serde_json::from_value::<T>(data.clone()) {
        Ok(payload) => wrap(payload),
        Err(e) => ExercisePayload::Unsupported {
            kind: kind.to_string(),
            reason: format!("malformed {} data: {}", kind, e),
            data,
        },
    }
}

impl From<RawExercise> for Exercise {
    fn from(raw: RawExercise) -> Self {
        let RawExercise { id, kind, data } = raw;
        let payload = match ExerciseKind::from_str(&kind) {
            Some(ExerciseKind::VocabularyIntro) => {
                decode(data, ExercisePayload::VocabularyIntro, &kind)
            }
            Some(ExerciseKind::ListenAndSelect) => {
                decode(data, ExercisePayload::ListenAndSelect, &kind)
            }
            Some(ExerciseKind::MatchPairs) => decode(data, ExercisePayload::MatchPairs, &kind),
            Some(ExerciseKind::BuildSentence) => {
                decode(data, ExercisePayload::BuildSentence, &kind)
            }
            Some(ExerciseKind::FillInBlank) => decode(data, ExercisePayload::FillInBlank, &kind),
            Some(ExerciseKind::SpeakingPractice) => {
                decode(data, ExercisePayload::SpeakingPractice, &kind)
            }
            Some(ExerciseKind::DialogueCompletion) => {
                decode(data, ExercisePayload::DialogueCompletion, &kind)
            }
            Some(ExerciseKind::DialogueWithBlanks) => {
                decode(data, ExercisePayload::DialogueWithBlanks, &kind)
            }
            Some(ExerciseKind::ListenAndType) => {
                decode(data, ExercisePayload::ListenAndType, &kind)
            }
            None => ExercisePayload::Unsupported {
                reason: format!("unknown exercise type: {}", kind),
                kind,
                data,
            },
        };
        Exercise { id, payload }
    }
}

fn encode<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

impl From<Exercise> for RawExercise {
    fn from(exercise: Exercise) -> Self {
        let kind = exercise.type_name().to_string();
        let data = match exercise.payload {
            ExercisePayload::VocabularyIntro(v) => encode(&v),
            ExercisePayload::ListenAndSelect(v) => encode(&v),
            ExercisePayload::MatchPairs(v) => encode(&v),
            ExercisePayload::BuildSentence(v) => encode(&v),
            ExercisePayload::FillInBlank(v) => encode(&v),
            ExercisePayload::SpeakingPractice(v) => encode(&v),
            ExercisePayload::DialogueCompletion(v) => encode(&v),
            ExercisePayload::DialogueWithBlanks(v) => encode(&v),
            ExercisePayload::ListenAndType(v) => encode(&v),
            ExercisePayload::Unsupported { data, .. } => data,
        };
        RawExercise {
            id: exercise.id,
            kind,
            data,
        }
    }
}

/// Lesson as served by `GET /api/lessons/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl LessonDocument {
    /// Number of vocabulary introductions, the upper bound on completed vocabulary.
    pub fn vocabulary_count(&self) -> usize {
        self.exercises
            .iter()
            .filter(|e| e.kind() == Some(ExerciseKind::VocabularyIntro))
            .count()
    }
}
