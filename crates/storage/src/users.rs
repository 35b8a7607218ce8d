//! User accounts.
//!
//! The table is keyed by username. Password values are opaque digests
//! produced by the auth layer; this module never sees plain passwords.

use crate::error::{Result, StoreError};
use crate::table;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const HEADER: [&str; 4] = ["username", "password", "role", "created_at"];

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// The other role: user becomes admin and admin becomes user
    pub fn toggled(self) -> Self {
        match self {
            Role::User => Role::Admin,
            Role::Admin => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// One row of the user table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// Hex password digest
    pub password: String,
    pub role: Role,
    #[serde(with = "crate::timestamp")]
    pub created_at: NaiveDateTime,
}

/// Storage of user accounts.
pub trait UserRepository: Send + Sync {
    /// All accounts in insertion order
    fn all(&self) -> Result<Vec<UserRecord>>;

    fn get(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Add an account; fails with [`StoreError::Duplicate`] if the
    /// username is taken.
    fn insert(&self, record: UserRecord) -> Result<()>;

    fn update_password(&self, username: &str, password: &str) -> Result<()>;

    fn set_role(&self, username: &str, role: Role) -> Result<()>;
}

fn insert_into(rows: &mut Vec<UserRecord>, record: UserRecord) -> Result<()> {
    if rows.iter().any(|r| r.username == record.username) {
        return Err(StoreError::Duplicate {
            username: record.username,
        });
    }
    rows.push(record);
    Ok(())
}

fn find_mut<'a>(rows: &'a mut [UserRecord], username: &str) -> Result<&'a mut UserRecord> {
    rows.iter_mut()
        .find(|r| r.username == username)
        .ok_or_else(|| StoreError::NotFound {
            username: username.to_string(),
        })
}

// =============================================================================
// CSV-backed store
// =============================================================================

/// User table persisted as `username,password,role,created_at`.
#[derive(Debug)]
pub struct CsvUserStore {
    path: PathBuf,
    rows: RwLock<Vec<UserRecord>>,
}

impl CsvUserStore {
    /// Open the table, creating an empty one if the file is missing
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let rows: Vec<UserRecord> = table::load_or_create(path, &HEADER)?;
        info!("Opened user table with {} accounts", rows.len());
        Ok(Self {
            path: path.to_path_buf(),
            rows: RwLock::new(rows),
        })
    }

    /// Apply a mutation and persist the table while still holding the lock
    fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<UserRecord>) -> Result<()>,
    {
        let mut rows = self.rows.write();
        let mut updated = rows.clone();
        change(&mut updated)?;
        table::write_all(&self.path, &HEADER, &updated)?;
        *rows = updated;
        Ok(())
    }
}

impl UserRepository for CsvUserStore {
    fn all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.rows.read().clone())
    }

    fn get(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.rows.read().iter().find(|r| r.username == username).cloned())
    }

    fn insert(&self, record: UserRecord) -> Result<()> {
        self.mutate(|rows| insert_into(rows, record))
    }

    fn update_password(&self, username: &str, password: &str) -> Result<()> {
        self.mutate(|rows| {
            find_mut(rows, username)?.password = password.to_string();
            Ok(())
        })
    }

    fn set_role(&self, username: &str, role: Role) -> Result<()> {
        self.mutate(|rows| {
            find_mut(rows, username)?.role = role;
            Ok(())
        })
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Non-persistent user table, used by tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    rows: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserStore {
    fn all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.rows.read().clone())
    }

    fn get(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.rows.read().iter().find(|r| r.username == username).cloned())
    }

    fn insert(&self, record: UserRecord) -> Result<()> {
        insert_into(&mut self.rows.write(), record)
    }

    fn update_password(&self, username: &str, password: &str) -> Result<()> {
        find_mut(&mut self.rows.write(), username)?.password = password.to_string();
        Ok(())
    }

    fn set_role(&self, username: &str, role: Role) -> Result<()> {
        find_mut(&mut self.rows.write(), username)?.role = role;
        Ok(())
    }
}
