//! # Data Loader Crate
//!
//! Loads the read-only inputs of the recommender: the electronics catalog
//! (titles and images), the popularity table derived from the interaction
//! history, and the frozen matrix-factorization model.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Interaction, Item, Catalog)
//! - **parser**: CSV readers with transparent gzip support
//! - **popularity**: Mean rating per item with a global fallback
//! - **model**: Factor model artifact loading and validation
//! - **index**: Parallel catalog loading
//! - **config**: Paths of every data file
//! - **convert**: Offline conversion of raw JSON-lines dumps
//! - **bootstrap**: Download of missing data files
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Catalog, DataPaths, FactorModel};
//!
//! let paths = DataPaths::default();
//! let catalog = Catalog::load(&paths)?;
//! let model = FactorModel::load(&paths.model)?;
//!
//! println!("{} items in the model", model.item_count());
//! println!("B01 scores {} by popularity", catalog.popularity().score("B01"));
//! ```

// Public modules
pub mod bootstrap;
pub mod config;
pub mod convert;
pub mod error;
pub mod index;
pub mod model;
pub mod parser;
pub mod popularity;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{DataPaths, RemoteFile};
pub use convert::ConversionStats;
pub use error::{DataLoadError, Result};
pub use model::{FactorModel, FactorModelArtifact};
pub use popularity::{PopularityAccumulator, PopularityTable};
pub use types::{
    // Type aliases
    ItemId,
    UserId,
    // Core types
    Catalog,
    ImageRow,
    Interaction,
    Item,
    TitleRow,
    PLACEHOLDER_IMAGE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::new();
        let (titles, images, interactions) = catalog.counts();

        assert_eq!(titles, 0);
        assert_eq!(images, 0);
        assert_eq!(interactions, 0);
        assert!(catalog.popularity().is_empty());
    }

    #[test]
    fn test_insert_title_and_image() {
        let mut catalog = Catalog::new();
        catalog.insert_title(TitleRow {
            asin: "B01".to_string(),
            title: "Bluetooth Speaker".to_string(),
        });
        catalog.insert_image(ImageRow {
            asin: "B01".to_string(),
            image: "https://img/b01.jpg".to_string(),
        });

        let item = catalog.item("B01");
        assert_eq!(item.title, "Bluetooth Speaker");
        assert_eq!(item.image_url, "https://img/b01.jpg");
    }

    #[test]
    fn test_unknown_item_falls_back() {
        let catalog = Catalog::new();
        let item = catalog.item("B99");

        assert_eq!(item.id, "B99");
        assert_eq!(item.title, "B99");
        assert_eq!(item.image_url, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_set_popularity() {
        let mut catalog = Catalog::new();
        let mut means = HashMap::new();
        means.insert("A".to_string(), 4.0);
        means.insert("B".to_string(), 2.0);
        catalog.set_popularity(PopularityTable::from_means(means), 10);

        assert_eq!(catalog.counts().2, 10);
        assert_eq!(catalog.popularity().score("A"), 4.0);
        assert_eq!(catalog.popularity().score("Z"), 3.0);
    }
}
