//! Per-exercise answer grading.
//!
//! Every rule is side-effect free and resolves gendered content under the
//! learner's current preference before comparing.

use crate::error::EvaluationError;
use crate::exercise::{Exercise, ExerciseKind, ExercisePayload, MatchPairs, Text};
use crate::gender::{resolve_array, Gender};
use crate::matching::{compare_answers, ComparisonMode};
use serde::{Deserialize, Serialize};

/// Learner input for one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// A selected option by value.
    Choice(String),
    /// A selected option by position.
    Index(usize),
    /// Free text typed by the learner.
    Text(String),
    /// Words in the order the learner arranged them.
    Order(Vec<String>),
    /// One typed answer per dialogue blank.
    Blanks(Vec<String>),
    /// Complete set of (hebrew, english) matches.
    Pairs(Vec<(String, String)>),
    /// Learner's own verdict, for exercises nothing can grade.
    SelfAssessed(bool),
}

impl Answer {
    fn shape(&self) -> &'static str {
        match self {
            Self::Choice(_) => "choice",
            Self::Index(_) => "index",
            Self::Text(_) => "text",
            Self::Order(_) => "order",
            Self::Blanks(_) => "blanks",
            Self::Pairs(_) => "pairs",
            Self::SelfAssessed(_) => "self-assessed",
        }
    }
}

/// Outcome of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub is_correct: bool,
    /// Learner answer as compared (for display).
    pub given: String,
    /// Expected answer as compared (for display).
    pub expected: String,
}

impl Evaluation {
    fn new(is_correct: bool, given: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            is_correct,
            given: given.into(),
            expected: expected.into(),
        }
    }
}

impl ExerciseKind {
    /// Whether results of this kind count toward the lesson score.
    pub fn is_graded(&self) -> bool {
        !matches!(self, Self::VocabularyIntro | Self::SpeakingPractice)
    }
}

/// Grade `answer` against `exercise`.
pub fn evaluate(
    exercise: &Exercise,
    answer: &Answer,
    gender: Gender,
    mode: ComparisonMode,
) -> Result<Evaluation, EvaluationError> {
    let kind = match exercise.kind() {
        Some(kind) => kind,
        None => {
            return Err(EvaluationError::Unsupported {
                kind: exercise.type_name().to_string(),
            })
        }
    };
    let shape_error = || EvaluationError::AnswerShape {
        kind,
        answer: answer.shape(),
    };

    match (&exercise.payload, answer) {
        (ExercisePayload::VocabularyIntro(_), Answer::SelfAssessed(ok))
        | (ExercisePayload::SpeakingPractice(_), Answer::SelfAssessed(ok)) => {
            Ok(Evaluation::new(*ok, ok.to_string(), "true"))
        }

        (ExercisePayload::ListenAndSelect(data), Answer::Choice(choice)) => {
            let expected = data.correct_answer.resolve(gender);
            Ok(Evaluation::new(choice == expected, choice.as_str(), expected.as_str()))
        }
        (ExercisePayload::ListenAndSelect(data), Answer::Index(index)) => {
            let expected = data.correct_answer.resolve(gender);
            let chosen = option_at(&data.options, *index, gender);
            Ok(Evaluation::new(
                chosen == Some(expected.as_str()),
                chosen.unwrap_or_default(),
                expected.as_str(),
            ))
        }

        (ExercisePayload::DialogueCompletion(data), Answer::Index(index)) => {
            let expected = option_at(&data.options, data.correct_index, gender);
            Ok(Evaluation::new(
                *index == data.correct_index,
                option_at(&data.options, *index, gender).unwrap_or_default(),
                expected.unwrap_or_default(),
            ))
        }
        (ExercisePayload::DialogueCompletion(data), Answer::Choice(choice)) => {
            let expected = option_at(&data.options, data.correct_index, gender);
            Ok(Evaluation::new(
                expected == Some(choice.as_str()),
                choice.as_str(),
                expected.unwrap_or_default(),
            ))
        }

        (ExercisePayload::BuildSentence(data), Answer::Order(words)) => {
            let expected = resolve_array(&data.correct_order, gender);
            Ok(Evaluation::new(
                *words == expected,
                words.join(" "),
                expected.join(" "),
            ))
        }

        (ExercisePayload::FillInBlank(data), Answer::Text(typed)) => {
            Ok(grade_text(typed, data.correct_answer.resolve(gender), mode))
        }
        (ExercisePayload::ListenAndType(data), Answer::Text(typed)) => {
            Ok(grade_text(typed, data.correct_answer.resolve(gender), mode))
        }

        (ExercisePayload::DialogueWithBlanks(data), Answer::Blanks(typed)) => {
            let results: Vec<Evaluation> = data
                .blanks
                .iter()
                .zip(typed.iter())
                .map(|(blank, typed)| grade_text(typed, blank.correct_answer.resolve(gender), mode))
                .collect();
            let is_correct =
                typed.len() == data.blanks.len() && results.iter().all(|r| r.is_correct);
            Ok(Evaluation::new(
                is_correct,
                results.iter().map(|r| r.given.as_str()).collect::<Vec<_>>().join(" | "),
                data.blanks
                    .iter()
                    .map(|b| b.correct_answer.resolve(gender).as_str())
                    .collect::<Vec<_>>()
                    .join(" | "),
            ))
        }

        (ExercisePayload::MatchPairs(data), Answer::Pairs(pairs)) => {
            let mut board = MatchBoard::new(data, gender);
            let mut all_accepted = true;
            for (left, right) in pairs {
                all_accepted &= board.try_match(left, right).unwrap_or(false);
            }
            Ok(Evaluation::new(
                all_accepted && board.is_complete(),
                format!("{} matches", pairs.len()),
                format!("{} matches", board.len()),
            ))
        }

        _ => Err(shape_error()),
    }
}

fn option_at(options: &[Text], index: usize, gender: Gender) -> Option<&str> {
    options.get(index).map(|o| o.resolve(gender).as_str())
}

fn grade_text(typed: &str, correct: &str, mode: ComparisonMode) -> Evaluation {
    let result = compare_answers(typed, correct, mode);
    Evaluation::new(
        result.is_correct,
        result.typed_normalized,
        result.correct_normalized,
    )
}

/// Incremental state of a match-pairs exercise.
///
/// Left items are the gender-resolved Hebrew side. Each authored pair can be
/// accepted at most once.
#[derive(Debug, Clone)]
pub struct MatchBoard {
    pairs: Vec<(String, String)>,
    matched: Vec<bool>,
}

impl MatchBoard {
    pub fn new(data: &MatchPairs, gender: Gender) -> Self {
        let pairs: Vec<(String, String)> = data
            .pairs
            .iter()
            .map(|p| (p.hebrew.resolve(gender).clone(), p.english.clone()))
            .collect();
        let matched = vec![false; pairs.len()];
        Self { pairs, matched }
    }

    /// Try to pair `left` with `right`.
    ///
    /// Returns `Ok(true)` and records the match when the pair is authored and
    /// still open, `Ok(false)` for a wrong pairing, and an error when either side
    /// has no open pair left.
    pub fn try_match(&mut self, left: &str, right: &str) -> Result<bool, EvaluationError> {
        let open = self.open_pairs().find(|&i| {
            let (l, r) = &self.pairs[i];
            l == left && r == right
        });
        if let Some(index) = open {
            self.matched[index] = true;
            return Ok(true);
        }

        let left_used = self.side_exhausted(|(l, _)| l == left);
        let right_used = self.side_exhausted(|(_, r)| r == right);
        if left_used || right_used {
            return Err(EvaluationError::AlreadyMatched {
                left: left.to_string(),
                right: right.to_string(),
            });
        }
        Ok(false)
    }

    pub fn is_complete(&self) -> bool {
        self.matched_count() == self.pairs.len()
    }

    pub fn matched_count(&self) -> usize {
        self.matched.iter().filter(|m| **m).count()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Left items without an accepted match, in authored order.
    pub fn open_left(&self) -> Vec<&str> {
        self.open_pairs().map(|i| self.pairs[i].0.as_str()).collect()
    }

    /// Right items without an accepted match, in authored order.
    pub fn open_right(&self) -> Vec<&str> {
        self.open_pairs().map(|i| self.pairs[i].1.as_str()).collect()
    }

    fn open_pairs(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.pairs.len()).filter(move |&i| !self.matched[i])
    }

    /// True when the side occurs in the pairs and every occurrence is matched.
    fn side_exhausted(&self, on_side: impl Fn(&(String, String)) -> bool) -> bool {
        let mut occurrences = self
            .pairs
            .iter()
            .zip(&self.matched)
            .filter(|&(pair, _)| on_side(pair))
            .peekable();
        occurrences.peek().is_some() && occurrences.all(|(_, matched)| *matched)
    }
}
