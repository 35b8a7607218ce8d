//! Core domain types for the electronics catalog.
//!
//! Items and users are keyed by the string identifiers found in the
//! review dumps (`parent_asin` for items, the reviewer/user id for users).

use crate::popularity::PopularityTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Identifier of a user, as it appears in the factor model's user index
/// and in the feedback table.
pub type UserId = String;

/// Catalog identifier of an item (an Amazon "asin" / "parent_asin").
pub type ItemId = String;

/// Image shown for items without an entry in the image map.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300";

// =============================================================================
// Rows read from the tabular inputs
// =============================================================================

/// One historical interaction row: `user_id,parent_asin,rating,timestamp`.
///
/// Ratings and timestamps may be empty in the converted dumps, so both
/// are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub parent_asin: ItemId,
    pub rating: Option<f32>,
    /// Milliseconds since the epoch. Dumps with missing timestamps carry
    /// the column as floats (`1588615855070.0`).
    pub timestamp: Option<f64>,
}

/// Row of the `asin,title` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRow {
    pub asin: ItemId,
    pub title: String,
}

/// Row of the `asin,image` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRow {
    pub asin: ItemId,
    pub image: String,
}

// =============================================================================
// Item view
// =============================================================================

/// Display view of a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub image_url: String,
}

// =============================================================================
// Catalog - read-only item metadata plus the popularity table
// =============================================================================

/// Read-only catalog data loaded once at startup.
///
/// Holds the title and image maps and the popularity table derived from
/// the interaction history. Lookups that miss fall back to the asin for
/// titles and to [`PLACEHOLDER_IMAGE`] for images.
#[derive(Debug)]
pub struct Catalog {
    pub(crate) titles: HashMap<ItemId, String>,
    pub(crate) images: HashMap<ItemId, String>,
    pub(crate) popularity: PopularityTable,
    pub(crate) interaction_count: usize,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self {
            titles: HashMap::new(),
            images: HashMap::new(),
            popularity: PopularityTable::default(),
            interaction_count: 0,
        }
    }

    /// Title of an item, or the asin itself when the title map has no entry
    pub fn title<'a>(&'a self, asin: &'a str) -> &'a str {
        self.titles.get(asin).map(String::as_str).unwrap_or(asin)
    }

    /// Image URL of an item, or the placeholder image
    pub fn image(&self, asin: &str) -> &str {
        self.images
            .get(asin)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Build the display view of an item
    pub fn item(&self, asin: &str) -> Item {
        Item {
            id: asin.to_string(),
            title: self.title(asin).to_string(),
            image_url: self.image(asin).to_string(),
        }
    }

    /// Mean historical rating per item
    pub fn popularity(&self) -> &PopularityTable {
        &self.popularity
    }

    pub fn insert_title(&mut self, row: TitleRow) {
        self.titles.insert(row.asin, row.title);
    }

    pub fn insert_image(&mut self, row: ImageRow) {
        self.images.insert(row.asin, row.image);
    }

    pub fn set_popularity(&mut self, popularity: PopularityTable, interaction_count: usize) {
        self.popularity = popularity;
        self.interaction_count = interaction_count;
    }

    /// Get counts for debugging/validation: (titles, images, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.titles.len(), self.images.len(), self.interaction_count)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
