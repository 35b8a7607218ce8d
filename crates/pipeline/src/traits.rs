//! The stage trait of the candidate pipeline.

use anyhow::Result;
use sources::{Candidate, UserContext};

/// One stage applied to the scored candidate universe.
///
/// A stage owns the candidates while it runs and hands back the ones that
/// move on. Stages may drop candidates or override their scores; the
/// dislike stage keeps every candidate and only forces scores down, so
/// the universe reaching the ranker is unchanged in size.
pub trait Filter: Send + Sync {
    /// Stage name used in debug logs
    fn name(&self) -> &str;

    /// Run the stage for the user described by `context`
    fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>>;
}
