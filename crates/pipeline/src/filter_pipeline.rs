//! The FilterPipeline chains stages together.

use crate::traits::Filter;
use anyhow::{Context, Result};
use sources::{Candidate, UserContext};
use tracing::debug;

/// Ordered list of stages, built with [`FilterPipeline::add_filter`].
///
/// ```ignore
/// let pipeline = FilterPipeline::new().add_filter(DislikedItemFilter);
/// let scored = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Append a stage (builder pattern)
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the stages in the order they run
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every stage in order. The first failing stage aborts the run.
    pub fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            let before = current.len();
            current = filter
                .apply(current, context)
                .with_context(|| format!("Filter {} failed", filter.name()))?;
            debug!(
                "Applied {}: {} -> {} candidates for user {}",
                filter.name(),
                before,
                current.len(),
                context.user_id
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
