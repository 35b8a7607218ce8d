//! Popularity table: mean historical rating per item.
//!
//! Built once from the interaction table and used as the cold-start
//! scoring signal. Items the table does not know about score at the
//! global mean, i.e. the mean of all per-item means.

use crate::types::{Interaction, ItemId};
use std::collections::HashMap;

/// Mean rating per item plus the fallback for unknown items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopularityTable {
    means: HashMap<ItemId, f32>,
    global_mean: f32,
}

impl PopularityTable {
    /// Build a table directly from per-item means.
    ///
    /// The global mean is the unweighted mean of the per-item means, and
    /// 0.0 for an empty table.
    pub fn from_means(means: HashMap<ItemId, f32>) -> Self {
        let global_mean = if means.is_empty() {
            0.0
        } else {
            let total: f64 = means.values().map(|&m| m as f64).sum();
            (total / means.len() as f64) as f32
        };
        Self { means, global_mean }
    }

    /// Popularity score of an item, falling back to the global mean
    pub fn score(&self, item: &str) -> f32 {
        self.means.get(item).copied().unwrap_or(self.global_mean)
    }

    /// Mean rating of an item if it has any rated interaction
    pub fn mean(&self, item: &str) -> Option<f32> {
        self.means.get(item).copied()
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// Streaming (sum, count) aggregation so the interaction table never has
/// to be held in memory.
#[derive(Debug, Default)]
pub struct PopularityAccumulator {
    totals: HashMap<ItemId, (f64, u32)>,
}

impl PopularityAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one interaction in; rows without a rating are ignored.
    pub fn add(&mut self, interaction: &Interaction) {
        let Some(rating) = interaction.rating else {
            return;
        };
        let entry = self
            .totals
            .entry(interaction.parent_asin.clone())
            .or_insert((0.0, 0));
        entry.0 += rating as f64;
        entry.1 += 1;
    }

    pub fn finish(self) -> PopularityTable {
        let means = self
            .totals
            .into_iter()
            .map(|(item, (sum, count))| (item, (sum / count as f64) as f32))
            .collect();
        PopularityTable::from_means(means)
    }
}
