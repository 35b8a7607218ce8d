//! Error types for the data-loader crate.
//!
//! Every variant here is a startup-fatal condition: the catalog, the
//! popularity table and the factor model are either loaded completely or
//! not at all.

use thiserror::Error;

/// Errors that can occur while loading, converting or downloading data files.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A CSV table could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The factor model artifact is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Line in a data file couldn't be parsed
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A required column is missing from a CSV header
    #[error("Missing column {column} in {file}")]
    MissingColumn { file: String, column: String },

    /// An index and its factor matrix disagree on length
    #[error("Misaligned factor model: {index} index has {index_len} entries but {matrix} has {rows} rows")]
    MisalignedModel {
        index: String,
        index_len: usize,
        matrix: String,
        rows: usize,
    },

    /// Any other structural problem with the factor model
    #[error("Invalid factor model: {0}")]
    InvalidModel(String),

    /// Downloading a missing data file failed
    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
