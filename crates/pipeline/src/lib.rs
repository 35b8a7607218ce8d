//! Pipeline for rescoring and ranking recommendation candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate stages
//! - FilterPipeline for composing stages
//! - Top-N ranking
//!
//! ## Architecture
//! The pipeline processes the scored universe in stages:
//! 1. Filters adjust scores (disliked items are forced to the sentinel)
//! 2. The ranker sorts by score, stably, and keeps the top N
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, filters::DislikedItemFilter, ranking::rank_top_n};
//!
//! let pipeline = FilterPipeline::new().add_filter(DislikedItemFilter);
//! let scored = pipeline.apply(candidates, &context)?;
//! let top = rank_top_n(scored, 8);
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod ranking;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use filters::{DISLIKE_SENTINEL, DislikedItemFilter};
pub use ranking::rank_top_n;
pub use traits::Filter;
