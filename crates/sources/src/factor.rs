//! Factor Source - personalised scoring from the latent factor model
//!
//! ## Algorithm
//! 1. Look up the user's row in the factor model
//! 2. Score every item in the item index by `dot(user_row, item_row)`
//! 3. Return one candidate per item, in item-index order
//!
//! Users without a row are not covered by this source; the orchestrator
//! falls back to [`crate::PopularitySource`] for them.

use crate::types::{Candidate, CandidateSource, UserContext};
use data_loader::{FactorModel, model::dot};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Scores every catalog item for users known to the factor model
#[derive(Clone)]
pub struct FactorSource {
    /// Shared reference to the frozen model (read-only, so no Mutex needed)
    model: Arc<FactorModel>,
}

impl FactorSource {
    pub fn new(model: Arc<FactorModel>) -> Self {
        Self { model }
    }

    /// Whether the model has a factor row for this user
    pub fn covers(&self, user_context: &UserContext) -> bool {
        self.model.contains_user(&user_context.user_id)
    }

    /// Score the whole item universe for a user.
    ///
    /// Returns an empty list when the user has no factor row. The output
    /// keeps item-index order so a stable sort preserves it among ties.
    #[instrument(skip(self, user_context), fields(user_id = %user_context.user_id))]
    pub fn get_candidates(&self, user_context: &UserContext) -> Vec<Candidate> {
        let Some(user_row) = self.model.user_row(&user_context.user_id) else {
            debug!("User {} has no factor row", user_context.user_id);
            return Vec::new();
        };

        let candidates: Vec<Candidate> = self
            .model
            .items()
            .par_iter()
            .enumerate()
            .map(|(position, item)| {
                let score = dot(user_row, self.model.item_row(position));
                Candidate::new(item.as_str(), CandidateSource::Factor, score).at_position(position)
            })
            .collect();

        debug!("Generated {} factor candidates", candidates.len());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::FactorModelArtifact;

    fn create_test_model() -> FactorModel {
        FactorModel::from_artifact(FactorModelArtifact {
            users: vec!["u1".to_string(), "u2".to_string()],
            items: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            user_factors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            item_factors: vec![vec![0.9, 0.1], vec![0.5, 0.5], vec![0.2, 0.8]],
        })
        .unwrap()
    }

    #[test]
    fn test_scores_are_dot_products_in_index_order() {
        let source = FactorSource::new(Arc::new(create_test_model()));
        let context = UserContext::new("u1");

        let candidates = source.get_candidates(&context);
        let scores: Vec<f32> = candidates.iter().map(|c| c.base_score).collect();
        let ids: Vec<&str> = candidates.iter().map(|c| c.item_id.as_str()).collect();

        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
        assert_eq!(candidates[2].metadata.index_position, 2);
        assert!(candidates.iter().all(|c| c.source == CandidateSource::Factor));
    }

    #[test]
    fn test_unknown_user_is_not_covered() {
        let source = FactorSource::new(Arc::new(create_test_model()));
        let context = UserContext::new("stranger");

        assert!(!source.covers(&context));
        assert!(source.get_candidates(&context).is_empty());
    }
}
