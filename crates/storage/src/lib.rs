//! # Storage Crate
//!
//! The mutable state of the recommender: user accounts and the feedback
//! log. Both live behind repository traits so the medium can be swapped;
//! flat CSV tables and in-memory tables are provided.
//!
//! ```ignore
//! use storage::{CsvFeedbackStore, FeedbackRecord, FeedbackRepository, FeedbackValue};
//!
//! let store = CsvFeedbackStore::open(Path::new("data/user_feedback.csv"))?;
//! store.append(FeedbackRecord::now("alice", "B01", FeedbackValue::Dislike))?;
//! ```

pub mod error;
pub mod feedback;
pub mod table;
pub mod timestamp;
pub mod users;

pub use error::{Result, StoreError};
pub use feedback::{
    CsvFeedbackStore, FeedbackRecord, FeedbackRepository, FeedbackValue, InMemoryFeedbackStore,
};
pub use users::{CsvUserStore, InMemoryUserStore, Role, UserRecord, UserRepository};
