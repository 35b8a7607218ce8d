//! Frozen matrix-factorization model.
//!
//! The artifact is a JSON object (optionally gzip-compressed) with four
//! fields: `users`, `items`, `user_factors` and `item_factors`. Loading
//! validates the alignment between each index and its matrix; a model
//! that fails validation is never handed to the scoring code.
//!
//! Factors are stored flattened, row-major, so that a row lookup is a
//! slice into one contiguous buffer.

use crate::error::{DataLoadError, Result};
use crate::parser::open_maybe_gz;
use crate::types::{ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// On-disk shape of the model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorModelArtifact {
    pub users: Vec<UserId>,
    pub items: Vec<ItemId>,
    pub user_factors: Vec<Vec<f32>>,
    pub item_factors: Vec<Vec<f32>>,
}

/// Validated factor model.
///
/// Invariant: row `i` of the user matrix belongs to `users[i]`, row `j` of
/// the item matrix belongs to `items[j]`, and every row has `dimension`
/// entries.
#[derive(Debug, Clone)]
pub struct FactorModel {
    users: Vec<UserId>,
    items: Vec<ItemId>,
    user_positions: HashMap<UserId, usize>,
    item_positions: HashMap<ItemId, usize>,
    user_factors: Vec<f32>,
    item_factors: Vec<f32>,
    dimension: usize,
}

impl FactorModel {
    /// Load and validate a model artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading factor model from {:?}", path);
        let reader = open_maybe_gz(path)?;
        let artifact: FactorModelArtifact = serde_json::from_reader(reader)?;
        let model = Self::from_artifact(artifact)?;
        info!(
            "Factor model loaded: {} users, {} items, dimension {}",
            model.user_count(),
            model.item_count(),
            model.dimension()
        );
        Ok(model)
    }

    /// Validate an artifact and build the lookup indices.
    ///
    /// The item matrix may be given either row-aligned (`n_items x k`) or
    /// transposed (`k x n_items`); the transposed form is normalised here.
    /// The two layouts cannot be told apart when `k == n_items`, and a
    /// square matrix is always read as row-aligned. Exporters of square
    /// models must write one row per item.
    pub fn from_artifact(artifact: FactorModelArtifact) -> Result<Self> {
        let FactorModelArtifact {
            users,
            items,
            user_factors,
            item_factors,
        } = artifact;

        if user_factors.len() != users.len() {
            return Err(DataLoadError::MisalignedModel {
                index: "user".to_string(),
                index_len: users.len(),
                matrix: "user_factors".to_string(),
                rows: user_factors.len(),
            });
        }

        let dimension = match user_factors.first() {
            Some(row) => row.len(),
            None => item_dimension_without_users(&items, &item_factors),
        };

        let item_factors = if item_factors.len() == items.len() {
            item_factors
        } else if is_transposed(&items, &item_factors, dimension) {
            debug!("Item factors are stored transposed, normalising to rows");
            transpose(&item_factors, items.len())
        } else {
            return Err(DataLoadError::MisalignedModel {
                index: "item".to_string(),
                index_len: items.len(),
                matrix: "item_factors".to_string(),
                rows: item_factors.len(),
            });
        };

        let user_factors = flatten("user_factors", user_factors, dimension)?;
        let item_factors = flatten("item_factors", item_factors, dimension)?;
        let user_positions = positions("user", &users)?;
        let item_positions = positions("item", &items)?;

        Ok(Self {
            users,
            items,
            user_positions,
            item_positions,
            user_factors,
            item_factors,
            dimension,
        })
    }

    /// Latent factor row of a user, if the user is in the index
    pub fn user_row(&self, user: &str) -> Option<&[f32]> {
        let position = *self.user_positions.get(user)?;
        Some(self.row(&self.user_factors, position))
    }

    /// Latent factor row of the item at `position` in the item index
    pub fn item_row(&self, position: usize) -> &[f32] {
        self.row(&self.item_factors, position)
    }

    /// Position of an item in the item index
    pub fn item_position(&self, item: &str) -> Option<usize> {
        self.item_positions.get(item).copied()
    }

    pub fn contains_user(&self, user: &str) -> bool {
        self.user_positions.contains_key(user)
    }

    pub fn contains_item(&self, item: &str) -> bool {
        self.item_positions.contains_key(item)
    }

    /// Item index in artifact order
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// User index in artifact order
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn row<'a>(&self, matrix: &'a [f32], position: usize) -> &'a [f32] {
        let start = position * self.dimension;
        &matrix[start..start + self.dimension]
    }
}

/// Dot product of two equally sized factor rows
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn item_dimension_without_users(items: &[ItemId], item_factors: &[Vec<f32>]) -> usize {
    if item_factors.len() == items.len() {
        item_factors.first().map(Vec::len).unwrap_or(0)
    } else {
        // Transposed layout: one row per latent dimension
        item_factors.len()
    }
}

fn is_transposed(items: &[ItemId], item_factors: &[Vec<f32>], dimension: usize) -> bool {
    item_factors.len() == dimension && item_factors.iter().all(|row| row.len() == items.len())
}

fn transpose(matrix: &[Vec<f32>], columns: usize) -> Vec<Vec<f32>> {
    (0..columns)
        .map(|column| matrix.iter().map(|row| row[column]).collect())
        .collect()
}

fn flatten(name: &str, rows: Vec<Vec<f32>>, dimension: usize) -> Result<Vec<f32>> {
    let mut flat = Vec::with_capacity(rows.len() * dimension);
    for (position, row) in rows.into_iter().enumerate() {
        if row.len() != dimension {
            return Err(DataLoadError::InvalidModel(format!(
                "{} row {} has {} factors, expected {}",
                name,
                position,
                row.len(),
                dimension
            )));
        }
        flat.extend(row);
    }
    Ok(flat)
}

fn positions(kind: &str, ids: &[String]) -> Result<HashMap<String, usize>> {
    let mut map = HashMap::with_capacity(ids.len());
    for (position, id) in ids.iter().enumerate() {
        if map.insert(id.clone(), position).is_some() {
            return Err(DataLoadError::InvalidModel(format!(
                "duplicate {} id {} in index",
                kind, id
            )));
        }
    }
    Ok(map)
}
