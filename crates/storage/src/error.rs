//! Error types for the storage crate.

use thiserror::Error;

/// Errors raised by the user and feedback repositories.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error while reading or rewriting a table
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be encoded or decoded
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Insert of a username that is already present
    #[error("User {username} already exists")]
    Duplicate { username: String },

    /// Update of a username that is not present
    #[error("User {username} not found")]
    NotFound { username: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
