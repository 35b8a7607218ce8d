//! # Recommendation Orchestrator
//!
//! Coordinates one recommendation request:
//! 1. Build the user context from the feedback log
//! 2. Score the item universe (factor source, or popularity on cold start)
//! 3. Apply the filter pipeline (disliked items drop to the sentinel)
//! 4. Rank stably and keep the top N
//! 5. Attach catalog titles and images
//!
//! Scoring is CPU-bound and synchronous; async callers run it on a
//! blocking thread.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument};

use data_loader::{Catalog, FactorModel, ItemId};
use pipeline::{rank_top_n, DislikedItemFilter, FilterPipeline};
use sources::{Candidate, CandidateSource, FactorSource, PopularitySource, UserContext};
use storage::{FeedbackRecord, FeedbackRepository, FeedbackValue};

/// Final recommendation returned to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub image_url: String,
    pub score: f32,
    pub source: CandidateSource,
    pub disliked: bool,
    pub explanation: String,
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<Catalog>,
    model: Arc<FactorModel>,
    factor: FactorSource,
    popularity: PopularitySource,
    filter_pipeline: Arc<FilterPipeline>,
    feedback: Arc<dyn FeedbackRepository>,
}

impl RecommendationOrchestrator {
    /// Create a new orchestrator over loaded data and a feedback store
    pub fn new(
        catalog: Arc<Catalog>,
        model: Arc<FactorModel>,
        feedback: Arc<dyn FeedbackRepository>,
    ) -> Self {
        let factor = FactorSource::new(model.clone());
        let popularity = PopularitySource::new(catalog.clone(), model.clone());
        let filter_pipeline = Arc::new(FilterPipeline::new().add_filter(DislikedItemFilter));
        Self {
            catalog,
            model,
            factor,
            popularity,
            filter_pipeline,
            feedback,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn model(&self) -> &FactorModel {
        &self.model
    }

    /// Up to `limit` item ids for `user_id`, best first
    pub fn recommend_ids(&self, user_id: &str, limit: usize) -> Result<Vec<ItemId>> {
        Ok(self
            .rank(user_id, limit)?
            .into_iter()
            .map(|candidate| candidate.item_id)
            .collect())
    }

    /// Main entry point: ranked recommendations with display metadata
    pub fn get_recommendations(&self, user_id: &str, limit: usize) -> Result<Vec<Recommendation>> {
        let ranked = self.rank(user_id, limit)?;
        Ok(ranked
            .into_iter()
            .map(|candidate| self.to_recommendation(candidate))
            .collect())
    }

    /// Append one like or dislike to the feedback log
    #[instrument(skip(self))]
    pub fn record_feedback(&self, user_id: &str, item_id: &str, value: FeedbackValue) -> Result<()> {
        self.feedback
            .append(FeedbackRecord::now(user_id, item_id, value))
            .context("Failed to record feedback")?;
        info!("Recorded {} of {} by {}", value.label(), item_id, user_id);
        Ok(())
    }

    #[instrument(skip(self))]
    fn rank(&self, user_id: &str, limit: usize) -> Result<Vec<Candidate>> {
        let start_time = Instant::now();

        let context = self.build_user_context(user_id)?;

        let candidates = self.generate_candidates(&context);
        info!(
            "Scored {} candidates for user {}",
            candidates.len(),
            user_id
        );

        let scored = self
            .filter_pipeline
            .apply(candidates, &context)
            .context("Failed to apply filters")?;

        let ranked = rank_top_n(scored, limit);
        info!(
            "Selected top {} recommendations for user {} in {:.2?}",
            ranked.len(),
            user_id,
            start_time.elapsed()
        );
        Ok(ranked)
    }

    fn build_user_context(&self, user_id: &str) -> Result<UserContext> {
        sources::user_context::load_user_context(user_id, self.feedback.as_ref())
            .context("Failed to build user context")
    }

    /// Factor scores for known users, popularity for everyone else
    fn generate_candidates(&self, context: &UserContext) -> Vec<Candidate> {
        if self.factor.covers(context) {
            self.factor.get_candidates(context)
        } else {
            info!("User {} is not in the factor model, using popularity", context.user_id);
            self.popularity.get_candidates(context)
        }
    }

    fn to_recommendation(&self, candidate: Candidate) -> Recommendation {
        let item = self.catalog.item(&candidate.item_id);
        let explanation = explain(&candidate);
        Recommendation {
            item_id: item.id,
            title: item.title,
            image_url: item.image_url,
            score: candidate.base_score,
            source: candidate.source,
            disliked: candidate.metadata.disliked,
            explanation,
        }
    }
}

fn explain(candidate: &Candidate) -> String {
    let meta = &candidate.metadata;
    if meta.disliked {
        return format!("Disliked by you (model score {:.3})", meta.raw_score);
    }
    match candidate.source {
        CandidateSource::Factor => format!("Predicted affinity {:.3}", candidate.base_score),
        CandidateSource::Popularity if meta.global_mean_fallback => {
            format!("Unrated item, catalog average {:.2}", candidate.base_score)
        }
        CandidateSource::Popularity => format!("Average rating {:.2}", candidate.base_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{FactorModelArtifact, ImageRow, PopularityTable, TitleRow, PLACEHOLDER_IMAGE};
    use pipeline::DISLIKE_SENTINEL;
    use std::collections::HashMap;
    use storage::InMemoryFeedbackStore;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn build_test_catalog() -> Arc<Catalog> {
        let mut catalog = Catalog::new();
        catalog.insert_title(TitleRow {
            asin: "A".to_string(),
            title: "Noise Cancelling Headphones".to_string(),
        });
        catalog.insert_title(TitleRow {
            asin: "B".to_string(),
            title: "USB-C Hub".to_string(),
        });
        catalog.insert_image(ImageRow {
            asin: "A".to_string(),
            image: "https://img/a.jpg".to_string(),
        });

        let mut means = HashMap::new();
        means.insert("A".to_string(), 4.0);
        means.insert("B".to_string(), 3.0);
        means.insert("C".to_string(), 5.0);
        catalog.set_popularity(PopularityTable::from_means(means), 3);
        Arc::new(catalog)
    }

    fn build_test_model() -> Arc<FactorModel> {
        Arc::new(
            FactorModel::from_artifact(FactorModelArtifact {
                users: vec!["u1".to_string()],
                items: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                user_factors: vec![vec![1.0, 0.0]],
                item_factors: vec![vec![0.9, 0.0], vec![0.5, 0.0], vec![0.2, 0.0]],
            })
            .unwrap(),
        )
    }

    fn build_test_orchestrator() -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(
            build_test_catalog(),
            build_test_model(),
            Arc::new(InMemoryFeedbackStore::new()),
        )
    }

    // ============================================================================
    // recommend_ids
    // ============================================================================

    #[test]
    fn test_cold_start_uses_popularity() {
        let orchestrator = build_test_orchestrator();
        let ids = orchestrator.recommend_ids("newcomer", 2).unwrap();
        assert_eq!(ids, vec!["C", "A"]);
    }

    #[test]
    fn test_known_user_uses_factors() {
        let orchestrator = build_test_orchestrator();
        let ids = orchestrator.recommend_ids("u1", 8).unwrap();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dislike_pushes_item_out() {
        let orchestrator = build_test_orchestrator();
        orchestrator.record_feedback("u1", "A", FeedbackValue::Dislike).unwrap();

        assert_eq!(orchestrator.recommend_ids("u1", 2).unwrap(), vec!["B", "C"]);
        assert_eq!(orchestrator.recommend_ids("u1", 3).unwrap(), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_like_does_not_retract_dislike() {
        let orchestrator = build_test_orchestrator();
        orchestrator.record_feedback("u1", "A", FeedbackValue::Dislike).unwrap();
        orchestrator.record_feedback("u1", "A", FeedbackValue::Like).unwrap();

        assert_eq!(orchestrator.recommend_ids("u1", 2).unwrap(), vec!["B", "C"]);
    }

    #[test]
    fn test_zero_limit() {
        let orchestrator = build_test_orchestrator();
        assert!(orchestrator.recommend_ids("u1", 0).unwrap().is_empty());
    }

    #[test]
    fn test_idempotent_without_feedback() {
        let orchestrator = build_test_orchestrator();
        assert_eq!(
            orchestrator.get_recommendations("newcomer", 3).unwrap(),
            orchestrator.get_recommendations("newcomer", 3).unwrap()
        );
    }

    // ============================================================================
    // get_recommendations
    // ============================================================================

    #[test]
    fn test_recommendations_carry_catalog_metadata() {
        let orchestrator = build_test_orchestrator();
        let recs = orchestrator.get_recommendations("u1", 3).unwrap();

        assert_eq!(recs[0].title, "Noise Cancelling Headphones");
        assert_eq!(recs[0].image_url, "https://img/a.jpg");
        assert_eq!(recs[0].source, CandidateSource::Factor);
        // C has neither a title nor an image
        assert_eq!(recs[2].title, "C");
        assert_eq!(recs[2].image_url, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_disliked_recommendation_is_marked() {
        let orchestrator = build_test_orchestrator();
        orchestrator.record_feedback("newcomer", "C", FeedbackValue::Dislike).unwrap();

        let recs = orchestrator.get_recommendations("newcomer", 3).unwrap();
        let last = &recs[2];
        assert_eq!(last.item_id, "C");
        assert!(last.disliked);
        assert_eq!(last.score, DISLIKE_SENTINEL);
        assert!(last.explanation.starts_with("Disliked"));
    }
}
