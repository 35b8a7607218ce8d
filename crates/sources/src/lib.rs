//! # Sources Crate
//!
//! Candidate scoring sources for the electronics recommender.
//!
//! ## Components
//!
//! ### Factor Source (personalised)
//! Scores every item by the dot product of the user's and the item's
//! latent factors. Only covers users present in the factor model.
//!
//! ### Popularity Source (cold start)
//! Scores every item by its mean historical rating, with the global mean
//! of means for items nobody rated.
//!
//! Both sources score the same universe: the factor model's item index,
//! in index order.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{FactorSource, PopularitySource, user_context::load_user_context};
//! use std::sync::Arc;
//!
//! let context = load_user_context("alice", &feedback_store)?;
//!
//! let factor = FactorSource::new(model.clone());
//! let popularity = PopularitySource::new(catalog.clone(), model.clone());
//!
//! let candidates = if factor.covers(&context) {
//!     factor.get_candidates(&context)
//! } else {
//!     popularity.get_candidates(&context)
//! };
//! ```

// Public modules
pub mod factor;
pub mod popularity;
pub mod types;
pub mod user_context;

// Re-export commonly used types
pub use factor::FactorSource;
pub use popularity::PopularitySource;
pub use types::{Candidate, CandidateMetadata, CandidateSource, UserContext};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new("B01", CandidateSource::Factor, 0.85).at_position(7);
        assert_eq!(candidate.item_id, "B01");
        assert_eq!(candidate.source, CandidateSource::Factor);
        assert_eq!(candidate.base_score, 0.85);
        assert_eq!(candidate.metadata.raw_score, 0.85);
        assert_eq!(candidate.metadata.index_position, 7);
        assert!(!candidate.metadata.disliked);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CandidateSource::Factor.to_string(), "factor");
        assert_eq!(CandidateSource::Popularity.to_string(), "popularity");
    }
}
