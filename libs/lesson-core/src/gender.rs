//! Gender-variant content resolution.
//!
//! Curriculum text is authored either as a single value or as a
//! `{ "male": ..., "female": ... }` pair. Resolution is pure and recomputed on
//! every read, so a changed preference is picked up by the next access.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Learner's grammatical gender preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Default for Gender {
    fn default() -> Self {
        Self::Male
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that is either shared by both genders or authored per gender.
///
/// A variant pair must carry both branches; a record missing one fails to
/// deserialize as a pair and is treated as an authoring defect upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gendered<T> {
    Variants { male: T, female: T },
    Plain(T),
}

impl<T> Gendered<T> {
    /// Pick the branch for `gender`. Plain values ignore the preference.
    pub fn resolve(&self, gender: Gender) -> &T {
        match self {
            Self::Plain(value) => value,
            Self::Variants { male, female } => match gender {
                Gender::Male => male,
                Gender::Female => female,
            },
        }
    }

    pub fn into_resolved(self, gender: Gender) -> T {
        match self {
            Self::Plain(value) => value,
            Self::Variants { male, female } => match gender {
                Gender::Male => male,
                Gender::Female => female,
            },
        }
    }

    pub fn is_gendered(&self) -> bool {
        matches!(self, Self::Variants { .. })
    }
}

impl<T> From<T> for Gendered<T> {
    fn from(value: T) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for Gendered<String> {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl Gendered<String> {
    /// Shorthand for authoring a male/female text pair.
    pub fn pair(male: impl Into<String>, female: impl Into<String>) -> Self {
        Self::Variants {
            male: male.into(),
            female: female.into(),
        }
    }
}

/// Resolve a single gendered value.
pub fn resolve<T>(value: &Gendered<T>, gender: Gender) -> &T {
    value.resolve(gender)
}

/// Resolve every element, preserving order and length.
pub fn resolve_array<T: Clone>(values: &[Gendered<T>], gender: Gender) -> Vec<T> {
    values.iter().map(|v| v.resolve(gender).clone()).collect()
}
