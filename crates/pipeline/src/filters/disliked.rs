//! Push disliked items out of the top of the ranking.
//!
//! Disliked items are not removed. Their score is overridden with
//! [`DISLIKE_SENTINEL`], which sorts below every real score, so they can
//! only surface when the requested list is longer than the number of
//! items the user has not disliked.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};

/// Score given to disliked items.
///
/// Finite, so it stays serialisable and orders normally.
pub const DISLIKE_SENTINEL: f32 = f32::MIN;

/// Overrides the score of every candidate the user disliked at least once.
pub struct DislikedItemFilter;

impl Filter for DislikedItemFilter {
    fn name(&self) -> &str {
        "DislikedItemFilter"
    }

    fn apply(&self, mut candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>> {
        if context.disliked_items.is_empty() {
            return Ok(candidates);
        }
        for candidate in candidates
            .iter_mut()
            .filter(|c| context.disliked_items.contains(&c.item_id))
        {
            candidate.base_score = DISLIKE_SENTINEL;
            candidate.metadata.disliked = true;
        }
        Ok(candidates)
    }
}
