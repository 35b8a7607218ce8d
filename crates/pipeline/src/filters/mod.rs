//! Filter implementations for the candidate pipeline.

pub mod disliked;

// Re-export for convenience
pub use disliked::{DISLIKE_SENTINEL, DislikedItemFilter};
