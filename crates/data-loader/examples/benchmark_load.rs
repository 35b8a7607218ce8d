use data_loader::{Catalog, DataPaths, FactorModel};
use std::time::Instant;

fn main() {
    let paths = DataPaths::default();

    println!("Loading electronics catalog...\n");

    let start = Instant::now();
    let catalog = Catalog::load(&paths).expect("Failed to load catalog");
    let catalog_elapsed = start.elapsed();

    let start = Instant::now();
    let model = FactorModel::load(&paths.model).expect("Failed to load factor model");
    let model_elapsed = start.elapsed();

    let (titles, images, interactions) = catalog.counts();

    println!("\n=== Load Complete ===");
    println!("Catalog time: {:?}", catalog_elapsed);
    println!("Model time: {:?}", model_elapsed);
    println!("Titles: {}", titles);
    println!("Images: {}", images);
    println!("Interactions: {}", interactions);
    println!("Model: {} users x {} items, k = {}", model.user_count(), model.item_count(), model.dimension());
    println!("\nPerformance: {:.0} interactions/second",
             interactions as f64 / catalog_elapsed.as_secs_f64());
}
