//! Integration tests for the pipeline.
//!
//! These tests run the sources, the dislike stage and the ranker together
//! over a small in-memory catalog, the same way the orchestrator does.

use data_loader::{Catalog, FactorModel, FactorModelArtifact, PopularityTable};
use pipeline::{rank_top_n, DislikedItemFilter, FilterPipeline, DISLIKE_SENTINEL};
use sources::{user_context::build_user_context, Candidate, FactorSource, PopularitySource, UserContext};
use std::collections::HashMap;
use std::sync::Arc;
use storage::{FeedbackRecord, FeedbackValue};

fn create_test_setup() -> (Arc<Catalog>, Arc<FactorModel>) {
    // u1 has factors [1, 0], so its dot products are the first factor column
    let model = FactorModel::from_artifact(FactorModelArtifact {
        users: vec!["u1".to_string()],
        items: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        user_factors: vec![vec![1.0, 0.0]],
        item_factors: vec![vec![0.9, 0.3], vec![0.5, 0.1], vec![0.2, 0.7]],
    })
    .unwrap();

    let mut means = HashMap::new();
    means.insert("A".to_string(), 4.0);
    means.insert("B".to_string(), 3.0);
    means.insert("C".to_string(), 5.0);
    let mut catalog = Catalog::new();
    catalog.set_popularity(PopularityTable::from_means(means), 3);

    (Arc::new(catalog), Arc::new(model))
}

fn recommend(context: &UserContext, limit: usize) -> Vec<Candidate> {
    let (catalog, model) = create_test_setup();
    let factor = FactorSource::new(model.clone());
    let popularity = PopularitySource::new(catalog, model);

    let candidates = if factor.covers(context) {
        factor.get_candidates(context)
    } else {
        popularity.get_candidates(context)
    };
    let scored = FilterPipeline::new()
        .add_filter(DislikedItemFilter)
        .apply(candidates, context)
        .unwrap();
    rank_top_n(scored, limit)
}

fn ids(candidates: &[Candidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.item_id.as_str()).collect()
}

#[test]
fn test_cold_start_ranks_by_popularity() {
    let context = build_user_context("newcomer", &[]);
    let ranked = recommend(&context, 2);

    assert_eq!(ids(&ranked), vec!["C", "A"]);
}

#[test]
fn test_known_user_ranks_by_dot_product() {
    let context = build_user_context("u1", &[]);
    let ranked = recommend(&context, 3);

    assert_eq!(ids(&ranked), vec!["A", "B", "C"]);
    assert!(ranked.windows(2).all(|w| w[0].base_score >= w[1].base_score));
}

#[test]
fn test_disliked_item_leaves_top_n() {
    let feedback = vec![FeedbackRecord::now("u1", "A", FeedbackValue::Dislike)];
    let context = build_user_context("u1", &feedback);

    assert_eq!(ids(&recommend(&context, 2)), vec!["B", "C"]);

    // Asking for the whole universe brings it back, last, at the sentinel
    let everything = recommend(&context, 10);
    assert_eq!(ids(&everything), vec!["B", "C", "A"]);
    assert_eq!(everything[2].base_score, DISLIKE_SENTINEL);
}

#[test]
fn test_like_after_dislike_stays_excluded() {
    let feedback = vec![
        FeedbackRecord::now("u1", "A", FeedbackValue::Dislike),
        FeedbackRecord::now("u1", "A", FeedbackValue::Like),
    ];
    let context = build_user_context("u1", &feedback);

    assert_eq!(ids(&recommend(&context, 2)), vec!["B", "C"]);
}

#[test]
fn test_cold_start_user_dislikes_apply_too() {
    let feedback = vec![FeedbackRecord::now("newcomer", "C", FeedbackValue::Dislike)];
    let context = build_user_context("newcomer", &feedback);

    assert_eq!(ids(&recommend(&context, 2)), vec!["A", "B"]);
}

#[test]
fn test_repeated_requests_are_identical() {
    let context = build_user_context("u1", &[]);
    assert_eq!(recommend(&context, 3), recommend(&context, 3));
}
