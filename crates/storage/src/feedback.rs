//! Append-only like/dislike log.
//!
//! Rows are never updated or deduplicated: a user who dislikes and later
//! likes the same item has two rows, and readers see both.

use crate::error::Result;
use crate::table;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const HEADER: [&str; 4] = ["user", "item", "feedback", "timestamp"];

/// Signed feedback value, stored as `1` or `-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum FeedbackValue {
    Like,
    Dislike,
}

impl FeedbackValue {
    pub fn label(self) -> &'static str {
        match self {
            FeedbackValue::Like => "Like",
            FeedbackValue::Dislike => "Dislike",
        }
    }
}

impl TryFrom<i8> for FeedbackValue {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(FeedbackValue::Like),
            -1 => Ok(FeedbackValue::Dislike),
            other => Err(format!("feedback must be 1 or -1, got {}", other)),
        }
    }
}

impl From<FeedbackValue> for i8 {
    fn from(value: FeedbackValue) -> Self {
        match value {
            FeedbackValue::Like => 1,
            FeedbackValue::Dislike => -1,
        }
    }
}

/// One row of the feedback log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user: String,
    pub item: String,
    pub feedback: FeedbackValue,
    #[serde(with = "crate::timestamp")]
    pub timestamp: NaiveDateTime,
}

impl FeedbackRecord {
    /// Record stamped with the current local time
    pub fn now(user: &str, item: &str, feedback: FeedbackValue) -> Self {
        Self {
            user: user.to_string(),
            item: item.to_string(),
            feedback,
            timestamp: chrono::Local::now().naive_local(),
        }
    }
}

/// Storage of the feedback log.
pub trait FeedbackRepository: Send + Sync {
    /// Append one row and make it durable before returning
    fn append(&self, record: FeedbackRecord) -> Result<()>;

    /// All rows in append order
    fn all(&self) -> Result<Vec<FeedbackRecord>>;

    /// Rows of one user in append order
    fn for_user(&self, user: &str) -> Result<Vec<FeedbackRecord>> {
        Ok(self.all()?.into_iter().filter(|r| r.user == user).collect())
    }
}

// =============================================================================
// CSV-backed store
// =============================================================================

/// Feedback log persisted as `user,item,feedback,timestamp`.
#[derive(Debug)]
pub struct CsvFeedbackStore {
    path: PathBuf,
    rows: RwLock<Vec<FeedbackRecord>>,
}

impl CsvFeedbackStore {
    /// Open the log, creating an empty one if the file is missing
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let rows: Vec<FeedbackRecord> = table::load_or_create(path, &HEADER)?;
        info!("Opened feedback log with {} rows", rows.len());
        Ok(Self {
            path: path.to_path_buf(),
            rows: RwLock::new(rows),
        })
    }
}

impl FeedbackRepository for CsvFeedbackStore {
    fn append(&self, record: FeedbackRecord) -> Result<()> {
        let mut rows = self.rows.write();
        rows.push(record);
        if let Err(e) = table::write_all(&self.path, &HEADER, &rows) {
            rows.pop();
            return Err(e);
        }
        debug!("Feedback log now has {} rows", rows.len());
        Ok(())
    }

    fn all(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self.rows.read().clone())
    }

    fn for_user(&self, user: &str) -> Result<Vec<FeedbackRecord>> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|r| r.user == user)
            .cloned()
            .collect())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    rows: RwLock<Vec<FeedbackRecord>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackRepository for InMemoryFeedbackStore {
    fn append(&self, record: FeedbackRecord) -> Result<()> {
        self.rows.write().push(record);
        Ok(())
    }

    fn all(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self.rows.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_is_durable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_feedback.csv");

        let store = CsvFeedbackStore::open(&path).unwrap();
        store.append(FeedbackRecord::now("u1", "A", FeedbackValue::Dislike)).unwrap();
        store.append(FeedbackRecord::now("u1", "A", FeedbackValue::Like)).unwrap();
        store.append(FeedbackRecord::now("u2", "B", FeedbackValue::Like)).unwrap();

        let reopened = CsvFeedbackStore::open(&path).unwrap();
        let rows = reopened.for_user("u1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].feedback, FeedbackValue::Dislike);
        assert_eq!(rows[1].feedback, FeedbackValue::Like);
        assert_eq!(reopened.all().unwrap().len(), 3);
    }

    #[test]
    fn test_file_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_feedback.csv");
        std::fs::write(
            &path,
            "user,item,feedback,timestamp\nu1,B01,-1,2024-03-01 10:00:00.000001\nu1,B02,1,2024-03-02T11:00:00\n",
        )
        .unwrap();

        let store = CsvFeedbackStore::open(&path).unwrap();
        let rows = store.all().unwrap();
        assert_eq!(rows[0].feedback, FeedbackValue::Dislike);
        assert_eq!(rows[1].item, "B02");

        store.append(FeedbackRecord::now("u2", "B03", FeedbackValue::Like)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("user,item,feedback,timestamp\n"));
        assert!(content.contains("u1,B01,-1,2024-03-01 10:00:00.000001\n"));
        assert!(content.contains("\nu2,B03,1,"));
    }

    #[test]
    fn test_invalid_feedback_value_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_feedback.csv");
        std::fs::write(&path, "user,item,feedback,timestamp\nu1,B01,0,2024-03-01 10:00:00\n").unwrap();

        assert!(CsvFeedbackStore::open(&path).is_err());
    }

    #[test]
    fn test_in_memory_for_user() {
        let store = InMemoryFeedbackStore::new();
        store.append(FeedbackRecord::now("u1", "A", FeedbackValue::Like)).unwrap();
        store.append(FeedbackRecord::now("u2", "B", FeedbackValue::Dislike)).unwrap();

        let rows = store.for_user("u2").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].feedback.label(), "Dislike");
    }
}
