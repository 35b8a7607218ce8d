//! Catalog loading.
//!
//! The three catalog inputs are independent, so they are parsed in
//! parallel with `rayon::join`. The interaction table is streamed straight
//! into a [`PopularityAccumulator`] and never materialised.

use crate::config::DataPaths;
use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::popularity::PopularityAccumulator;
use crate::types::*;
use std::path::Path;
use tracing::{info, instrument, warn};

impl Catalog {
    /// Load titles, images and the popularity table.
    ///
    /// The image map is optional: when the file is absent every item uses
    /// the placeholder image. The other two inputs are required.
    #[instrument(skip(paths), fields(interactions = %paths.interactions.display()))]
    pub fn load(paths: &DataPaths) -> Result<Self> {
        info!("Loading catalog");

        let ((titles, images), popularity) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_title_map(&paths.titles),
                    || load_optional_images(&paths.images),
                )
            },
            || {
                let mut acc = PopularityAccumulator::new();
                let count = parser::for_each_interaction(&paths.interactions, |row| acc.add(&row))?;
                Ok::<_, DataLoadError>((acc.finish(), count))
            },
        );

        let titles = titles?;
        let images = images?;
        let (popularity, interaction_count) = popularity?;

        let mut catalog = Catalog::new();
        for row in titles {
            catalog.insert_title(row);
        }
        for row in images {
            catalog.insert_image(row);
        }
        catalog.set_popularity(popularity, interaction_count);

        let (title_count, image_count, interaction_count) = catalog.counts();
        info!(
            "Catalog loaded: {} titles, {} images, {} interactions, {} rated items",
            title_count,
            image_count,
            interaction_count,
            catalog.popularity().len()
        );
        Ok(catalog)
    }

    /// Load only the title map.
    ///
    /// For callers that label items but never score them; images fall back
    /// to the placeholder and the popularity table is empty.
    #[instrument(skip(paths), fields(titles = %paths.titles.display()))]
    pub fn load_titles(paths: &DataPaths) -> Result<Self> {
        let mut catalog = Catalog::new();
        for row in parser::parse_title_map(&paths.titles)? {
            catalog.insert_title(row);
        }
        info!("Loaded {} titles", catalog.counts().0);
        Ok(catalog)
    }
}

fn load_optional_images(path: &Path) -> Result<Vec<ImageRow>> {
    match parser::parse_image_map(path) {
        Err(DataLoadError::FileNotFound { path }) => {
            warn!("Image map {} not found, using placeholder images", path);
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, with_images: bool) -> DataPaths {
        let mut paths = DataPaths::new(dir.path(), dir.path());
        paths.interactions = dir.path().join("Electronics.csv");
        fs::write(
            &paths.titles,
            "asin,title\nA,Alpha Speaker\nB,Beta Charger\nA,Alpha Speaker v2\n",
        )
        .unwrap();
        if with_images {
            fs::write(&paths.images, "asin,image\nA,https://img/a.jpg\n").unwrap();
        }
        fs::write(
            &paths.interactions,
            "user_id,parent_asin,rating,timestamp\nu1,A,4.0,1\nu2,A,2.0,2\nu3,B,5.0,3\nu4,C,,4\n",
        )
        .unwrap();
        paths
    }

    #[test]
    fn test_load_catalog() {
        let dir = TempDir::new().unwrap();
        let paths = write_catalog(&dir, true);

        let catalog = Catalog::load(&paths).unwrap();
        let (titles, images, interactions) = catalog.counts();

        assert_eq!(titles, 2);
        assert_eq!(images, 1);
        assert_eq!(interactions, 4);
        // Later duplicate wins
        assert_eq!(catalog.title("A"), "Alpha Speaker v2");
        assert_eq!(catalog.image("A"), "https://img/a.jpg");
        assert_eq!(catalog.popularity().mean("A"), Some(3.0));
        assert_eq!(catalog.popularity().mean("C"), None);
    }

    #[test]
    fn test_load_catalog_with_float_timestamps() {
        let dir = TempDir::new().unwrap();
        let paths = write_catalog(&dir, true);
        fs::write(
            &paths.interactions,
            "user_id,parent_asin,rating,timestamp\nu1,A,4.0,1588615855070.0\nu2,B,2.0,\n",
        )
        .unwrap();

        let catalog = Catalog::load(&paths).unwrap();
        assert_eq!(catalog.popularity().mean("A"), Some(4.0));
        assert_eq!(catalog.popularity().mean("B"), Some(2.0));
    }

    #[test]
    fn test_missing_image_map_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        let paths = write_catalog(&dir, false);

        let catalog = Catalog::load(&paths).unwrap();
        assert_eq!(catalog.image("A"), PLACEHOLDER_IMAGE);
        assert_eq!(catalog.title("Z"), "Z");
    }

    #[test]
    fn test_load_titles_skips_interactions() {
        let dir = TempDir::new().unwrap();
        let mut paths = write_catalog(&dir, true);
        paths.interactions = dir.path().join("nope.csv.gz");

        let catalog = Catalog::load_titles(&paths).unwrap();
        assert_eq!(catalog.title("A"), "Alpha Speaker v2");
        assert_eq!(catalog.image("A"), PLACEHOLDER_IMAGE);
        assert!(catalog.popularity().is_empty());
    }

    #[test]
    fn test_missing_interactions_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut paths = write_catalog(&dir, true);
        paths.interactions = dir.path().join("nope.csv.gz");

        assert!(matches!(
            Catalog::load(&paths),
            Err(DataLoadError::FileNotFound { .. })
        ));
    }
}
