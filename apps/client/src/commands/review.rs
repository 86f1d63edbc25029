//! Spaced-repetition review commands.

use crate::state::AppState;
use lesson_core::{ReviewCard, ReviewQuality, ReviewQueue, ReviewSummary};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::CommandError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewView {
    pub total: usize,
    pub current: Option<ReviewCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatedView {
    pub card_id: String,
    pub quality: ReviewQuality,
    pub remaining: usize,
    /// Whether the scheduler accepted the rating. The queue advances either way.
    pub submitted: bool,
    /// Set once the last card has been rated.
    pub summary: Option<ReviewSummary>,
}

/// Fetch the due cards and start a review pass over them.
pub async fn load_review(state: &AppState) -> Result<ReviewView, CommandError> {
    let user_id = state
        .config
        .user_id
        .as_deref()
        .ok_or_else(|| CommandError::new("HEBREW_USER_ID is not set"))?;
    let cards = state
        .api
        .get_due_reviews(user_id, state.config.review_limit)
        .await?;

    let run_id = state.run_id;
    let queue = ReviewQueue::new(cards).on_complete(move |summary| {
        info!(
            %run_id,
            reviewed = summary.reviewed,
            again = summary.again,
            "review complete"
        );
    });
    info!(cards = queue.len(), "review loaded");

    let view = ReviewView {
        total: queue.len(),
        current: queue.current().cloned(),
    };
    *state.review.lock()? = Some(queue);
    Ok(view)
}

pub fn current_card(state: &AppState) -> Result<Option<ReviewCard>, CommandError> {
    let guard = state.review.lock()?;
    let queue = guard
        .as_ref()
        .ok_or_else(|| CommandError::new("No review loaded"))?;
    Ok(queue.current().cloned())
}

/// Rate the current card and report it to the scheduler.
///
/// A failed submission is logged and not retried.
pub async fn rate_card(state: &AppState, quality: u8) -> Result<RatedView, CommandError> {
    let quality = ReviewQuality::try_from(quality)?;
    let (rated, summary) = {
        let mut guard = state.review.lock()?;
        let queue = guard
            .as_mut()
            .ok_or_else(|| CommandError::new("No review loaded"))?;
        let rated = queue.rate(quality)?;
        let summary = queue.is_exhausted().then(|| queue.summary().clone());
        (rated, summary)
    };

    let submitted = match state.api.submit_review(&rated.card.id, quality).await {
        Ok(()) => {
            debug!(word_id = %rated.card.id, quality = quality.to_value(), "review submitted");
            true
        }
        Err(e) => {
            warn!(word_id = %rated.card.id, error = %e, "review submission failed");
            false
        }
    };

    Ok(RatedView {
        card_id: rated.card.id,
        quality,
        remaining: rated.remaining,
        submitted,
        summary,
    })
}
