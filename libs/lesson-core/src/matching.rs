//! Hebrew text comparison for typed answers.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// First and last code points of the cantillation and vowel-point block.
const NIQQUD_START: char = '\u{0591}';
const NIQQUD_END: char = '\u{05C7}';

/// How strictly typed Hebrew is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// NFC-normalized, trimmed, otherwise exact.
    Strict,
    /// Like `Strict`, but niqqud (U+0591..=U+05C7) is ignored.
    DiacriticInsensitive,
}

impl Default for ComparisonMode {
    fn default() -> Self {
        Self::DiacriticInsensitive
    }
}

impl ComparisonMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::DiacriticInsensitive => "diacritic_insensitive",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "diacritic_insensitive" | "diacritic-insensitive" => Some(Self::DiacriticInsensitive),
            _ => None,
        }
    }
}

/// Result of comparing a typed answer to the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_correct: bool,
    pub matching_mode: ComparisonMode,
    /// Normalized typed answer (for display).
    pub typed_normalized: String,
    /// Normalized correct answer (for display).
    pub correct_normalized: String,
}

/// Compare a typed answer to the correct answer.
pub fn compare_answers(typed: &str, correct: &str, mode: ComparisonMode) -> MatchResult {
    let typed_normalized = normalize(typed, mode);
    let correct_normalized = normalize(correct, mode);

    MatchResult {
        is_correct: typed_normalized == correct_normalized,
        matching_mode: mode,
        typed_normalized,
        correct_normalized,
    }
}

/// Symmetric, reflexive equality of two Hebrew strings under `mode`.
pub fn compare_hebrew_text(a: &str, b: &str, mode: ComparisonMode) -> bool {
    normalize(a, mode) == normalize(b, mode)
}

/// Trim and NFC-normalize, dropping niqqud when the mode ignores it.
pub fn normalize(s: &str, mode: ComparisonMode) -> String {
    let composed: String = s.trim().nfc().collect();
    match mode {
        ComparisonMode::Strict => composed,
        ComparisonMode::DiacriticInsensitive => strip_niqqud(&composed),
    }
}

/// Remove Hebrew points and cantillation marks.
pub fn strip_niqqud(s: &str) -> String {
    s.chars().filter(|c| !is_niqqud(*c)).collect()
}

fn is_niqqud(c: char) -> bool {
    (NIQQUD_START..=NIQQUD_END).contains(&c)
}
