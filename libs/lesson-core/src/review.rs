//! Spaced-repetition review queue.
//!
//! The queue order is fixed once fetched. Every rating advances by exactly one
//! card whatever the quality; the quality only matters to the scheduler behind
//! the API.

use crate::error::ReviewError;
use serde::{Deserialize, Serialize};

/// Recall quality reported for a reviewed card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewQuality {
    Again,
    Hard,
    Good,
    Easy,
}

impl ReviewQuality {
    /// Numeric value sent to the scheduler.
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 3,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }

    /// Create from the numeric value. Only 1, 3, 4 and 5 are valid.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            3 => Some(Self::Hard),
            4 => Some(Self::Good),
            5 => Some(Self::Easy),
            _ => None,
        }
    }
}

impl TryFrom<u8> for ReviewQuality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or(ReviewError::InvalidQuality(value))
    }
}

/// A vocabulary card due for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCard {
    pub id: String,
    pub hebrew: String,
    pub english: String,
    #[serde(default)]
    pub repetitions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// Result of rating one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rated {
    pub card: ReviewCard,
    pub quality: ReviewQuality,
    /// Cards still waiting after this one.
    pub remaining: usize,
}

/// Totals reported once the queue is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub reviewed: usize,
    pub again: usize,
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
}

impl ReviewSummary {
    fn record(&mut self, quality: ReviewQuality) {
        self.reviewed += 1;
        match quality {
            ReviewQuality::Again => self.again += 1,
            ReviewQuality::Hard => self.hard += 1,
            ReviewQuality::Good => self.good += 1,
            ReviewQuality::Easy => self.easy += 1,
        }
    }
}

type CompletionCallback = Box<dyn FnOnce(&ReviewSummary) + Send>;

/// Linear pass over the due cards.
pub struct ReviewQueue {
    cards: Vec<ReviewCard>,
    index: usize,
    summary: ReviewSummary,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for ReviewQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewQueue")
            .field("cards", &self.cards.len())
            .field("index", &self.index)
            .field("summary", &self.summary)
            .finish()
    }
}

impl ReviewQueue {
    pub fn new(cards: Vec<ReviewCard>) -> Self {
        Self {
            cards,
            index: 0,
            summary: ReviewSummary::default(),
            on_complete: None,
        }
    }

    /// Register the callback fired once, when the last card is rated.
    pub fn on_complete(mut self, callback: impl FnOnce(&ReviewSummary) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn current(&self) -> Option<&ReviewCard> {
        self.cards.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.index == self.cards.len()
    }

    pub fn summary(&self) -> &ReviewSummary {
        &self.summary
    }

    /// Rate the current card and move to the next.
    pub fn rate(&mut self, quality: ReviewQuality) -> Result<Rated, ReviewError> {
        let card = self.current().cloned().ok_or(ReviewError::Exhausted)?;
        self.index += 1;
        self.summary.record(quality);

        if self.is_exhausted() {
            if let Some(callback) = self.on_complete.take() {
                callback(&self.summary);
            }
        }

        Ok(Rated {
            card,
            quality,
            remaining: self.remaining(),
        })
    }

    /// Rate `card`, which must be the current card.
    pub fn rate_card(
        &mut self,
        card_id: &str,
        quality: ReviewQuality,
    ) -> Result<Rated, ReviewError> {
        let expected = self.current().ok_or(ReviewError::Exhausted)?;
        if expected.id != card_id {
            return Err(ReviewError::WrongCard {
                expected: expected.id.clone(),
                given: card_id.to_string(),
            });
        }
        self.rate(quality)
    }
}
