//! Popularity Source - cold-start scoring
//!
//! Scores every item in the model's item index by its mean historical
//! rating. Items the popularity table has never seen a rating for score at
//! the table's global mean, so the candidate universe is identical to the
//! one the factor source produces.

use crate::types::{Candidate, CandidateSource, UserContext};
use data_loader::{Catalog, FactorModel};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Popularity-based candidates for users without a factor row
#[derive(Clone)]
pub struct PopularitySource {
    catalog: Arc<Catalog>,
    model: Arc<FactorModel>,
}

impl PopularitySource {
    pub fn new(catalog: Arc<Catalog>, model: Arc<FactorModel>) -> Self {
        Self { catalog, model }
    }

    /// Score the whole item universe by popularity, in item-index order
    #[instrument(skip(self, user_context), fields(user_id = %user_context.user_id))]
    pub fn get_candidates(&self, user_context: &UserContext) -> Vec<Candidate> {
        let popularity = self.catalog.popularity();

        let candidates: Vec<Candidate> = self
            .model
            .items()
            .iter()
            .enumerate()
            .map(|(position, item)| {
                let mean = popularity.mean(item);
                let score = mean.unwrap_or(popularity.global_mean());
                let mut candidate = Candidate::new(item.as_str(), CandidateSource::Popularity, score)
                    .at_position(position);
                candidate.metadata.global_mean_fallback = mean.is_none();
                candidate
            })
            .collect();

        debug!(
            "Generated {} popularity candidates (global mean {:.3})",
            candidates.len(),
            popularity.global_mean()
        );
        candidates
    }
}
