//! Account management: signup, login and password reset.
//!
//! Passwords are stored as the lowercase hex SHA-256 digest of their UTF-8
//! bytes, unsalted.

use std::sync::Arc;

use chrono::Local;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, instrument};

use storage::{Role, StoreError, UserRecord, UserRepository};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Validation and storage failures of account operations
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username {0} is already taken")]
    UsernameTaken(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// Hex SHA-256 digest of a password
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AuthError::EmptyField(field));
    }
    Ok(())
}

/// Account operations over a user repository
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Seed the default admin account when no user named `admin` exists.
    ///
    /// Returns whether the account was created.
    pub fn ensure_admin(&self) -> Result<bool> {
        if self.users.get(DEFAULT_ADMIN_USERNAME)?.is_some() {
            return Ok(false);
        }
        self.create(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, Role::Admin)?;
        info!("Seeded default admin account");
        Ok(true)
    }

    /// Register a new account with the `user` role
    #[instrument(skip(self, password))]
    pub fn signup(&self, username: &str, password: &str) -> Result<UserRecord> {
        require("username", username)?;
        require("password", password)?;
        let record = self.create(username, password, Role::User)?;
        info!("Created account {}", username);
        Ok(record)
    }

    /// Check credentials and return the matching account
    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<UserRecord> {
        require("username", username)?;
        require("password", password)?;
        let digest = hash_password(password);
        match self.users.get(username)? {
            Some(user) if user.password == digest => Ok(user),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Replace the password of an existing account
    #[instrument(skip(self, new_password))]
    pub fn reset_password(&self, username: &str, new_password: &str) -> Result<()> {
        require("username", username)?;
        require("password", new_password)?;
        self.users
            .update_password(username, &hash_password(new_password))
            .map_err(|e| match e {
                StoreError::NotFound { username } => AuthError::UserNotFound(username),
                other => AuthError::Store(other),
            })?;
        info!("Password reset for {}", username);
        Ok(())
    }

    fn create(&self, username: &str, password: &str, role: Role) -> Result<UserRecord> {
        let record = UserRecord {
            username: username.to_string(),
            password: hash_password(password),
            role,
            created_at: Local::now().naive_local(),
        };
        self.users.insert(record.clone()).map_err(|e| match e {
            StoreError::Duplicate { username } => AuthError::UsernameTaken(username),
            other => AuthError::Store(other),
        })?;
        Ok(record)
    }
}
