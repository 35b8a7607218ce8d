//! Candidate and user context types shared by the sources and the pipeline.

use data_loader::{ItemId, UserId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Which scoring signal produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    /// Dot product of the user's and the item's latent factors
    Factor,
    /// Mean historical rating (cold start)
    Popularity,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::Factor => write!(f, "factor"),
            CandidateSource::Popularity => write!(f, "popularity"),
        }
    }
}

/// Extra information carried alongside the score, used for explanations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateMetadata {
    /// Position of the item in the model's item index
    pub index_position: usize,
    /// Score before any override by a filter
    pub raw_score: f32,
    /// True when the item scored at the popularity table's global mean
    pub global_mean_fallback: bool,
    /// True when the score was forced down because the user disliked it
    pub disliked: bool,
}

/// A scored item that may end up in the recommendation list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub item_id: ItemId,
    pub source: CandidateSource,
    pub base_score: f32,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(item_id: impl Into<ItemId>, source: CandidateSource, base_score: f32) -> Self {
        Self {
            item_id: item_id.into(),
            source,
            base_score,
            metadata: CandidateMetadata {
                raw_score: base_score,
                ..CandidateMetadata::default()
            },
        }
    }

    pub fn at_position(mut self, index_position: usize) -> Self {
        self.metadata.index_position = index_position;
        self
    }
}

/// Everything the pipeline needs to know about the requesting user.
///
/// Built once per request from the feedback log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    pub user_id: UserId,
    /// Items with at least one dislike row. A later like does not remove
    /// an item from this set.
    pub disliked_items: HashSet<ItemId>,
    pub liked_items: HashSet<ItemId>,
    /// Number of feedback rows the context was built from
    pub feedback_count: usize,
}

impl UserContext {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}
