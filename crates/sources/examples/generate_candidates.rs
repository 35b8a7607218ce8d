//! Example: Generate candidates for a user
//!
//! Run with: cargo run --package sources --example generate_candidates -- <user_id>
//!
//! This example shows how to:
//! 1. Load the catalog and the factor model
//! 2. Build the user context from the feedback log
//! 3. Score the item universe with the factor source and the popularity source
//! 4. Display the best candidates of each

use data_loader::{Catalog, DataPaths, FactorModel};
use sources::{user_context::load_user_context, Candidate, FactorSource, PopularitySource};
use std::sync::Arc;
use std::time::Instant;
use storage::CsvFeedbackStore;

fn top(mut candidates: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.base_score.total_cmp(&a.base_score));
    candidates.truncate(n);
    candidates
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== Smart Recs Candidate Generation Example ===\n");

    let paths = DataPaths::default();
    let start = Instant::now();
    let catalog = Arc::new(Catalog::load(&paths)?);
    let model = Arc::new(FactorModel::load(&paths.model)?);
    println!("Loaded catalog and model in {:?}\n", start.elapsed());

    let user_id = std::env::args()
        .nth(1)
        .or_else(|| model.users().first().cloned())
        .unwrap_or_default();
    let feedback = CsvFeedbackStore::open(&paths.feedback)?;
    let context = load_user_context(&user_id, &feedback)?;
    println!("Target User: {}", user_id);
    println!("  Feedback rows: {}", context.feedback_count);
    println!("  Disliked items: {}", context.disliked_items.len());
    println!("  Liked items: {}\n", context.liked_items.len());

    let factor = FactorSource::new(model.clone());
    if factor.covers(&context) {
        let start = Instant::now();
        let candidates = factor.get_candidates(&context);
        println!("Scored {} items by factors in {:?}", candidates.len(), start.elapsed());
        for (i, candidate) in top(candidates, 5).iter().enumerate() {
            println!("  {}. {} (Score: {:.3})", i + 1, catalog.title(&candidate.item_id), candidate.base_score);
        }
    } else {
        println!("User {} has no factor row (cold start)", user_id);
    }

    let popularity = PopularitySource::new(catalog.clone(), model.clone());
    let start = Instant::now();
    let candidates = popularity.get_candidates(&context);
    println!("\nScored {} items by popularity in {:?}", candidates.len(), start.elapsed());
    for (i, candidate) in top(candidates, 5).iter().enumerate() {
        println!("  {}. {} (Mean rating: {:.2})", i + 1, catalog.title(&candidate.item_id), candidate.base_score);
    }

    Ok(())
}
