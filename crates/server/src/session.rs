//! In-memory bearer token sessions. Not persisted across restarts.
//!
//! Sessions expire a fixed time after login. Expired entries are dropped
//! when they are looked up and swept on every new login, so the registry
//! only holds sessions opened within the last TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use storage::{Role, UserRecord};
use tracing::debug;
use uuid::Uuid;

/// Lifetime of a session from login
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

#[derive(Debug)]
struct Entry {
    session: Session,
    issued_at: Instant,
}

#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Open a session for an authenticated user and return its token
    pub fn login(&self, user: &UserRecord) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut sessions = self.sessions.write();

        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        if sessions.len() < before {
            debug!("Swept {} expired sessions", before - sessions.len());
        }

        sessions.insert(
            token.clone(),
            Entry {
                session: Session {
                    username: user.username.clone(),
                    role: user.role,
                },
                issued_at: now,
            },
        );
        token
    }

    /// Session behind a token, unless it is unknown or expired
    pub fn get(&self, token: &str) -> Option<Session> {
        let now = Instant::now();
        {
            let sessions = self.sessions.read();
            let entry = sessions.get(token)?;
            if !self.is_expired(entry, now) {
                return Some(entry.session.clone());
            }
        }
        self.sessions.write().remove(token);
        None
    }

    /// Drop a session; returns false for unknown or expired tokens
    pub fn logout(&self, token: &str) -> bool {
        let now = Instant::now();
        self.sessions
            .write()
            .remove(token)
            .is_some_and(|entry| !self.is_expired(&entry, now))
    }

    /// Update the role cached in every open session of a user
    pub fn set_role(&self, username: &str, role: Role) {
        for entry in self
            .sessions
            .write()
            .values_mut()
            .filter(|e| e.session.username == username)
        {
            entry.session.role = role;
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.issued_at) >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn user(name: &str, role: Role) -> UserRecord {
        UserRecord {
            username: name.to_string(),
            password: String::new(),
            role,
            created_at: Local::now().naive_local(),
        }
    }

    #[test]
    fn test_login_logout() {
        let registry = SessionRegistry::new();
        let token = registry.login(&user("alice", Role::User));

        assert_eq!(registry.get(&token).unwrap().username, "alice");
        assert!(registry.logout(&token));
        assert!(!registry.logout(&token));
        assert!(registry.get(&token).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_tokens_are_unique() {
        let registry = SessionRegistry::new();
        let a = registry.login(&user("alice", Role::User));
        let b = registry.login(&user("alice", Role::User));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_set_role_updates_open_sessions() {
        let registry = SessionRegistry::new();
        let token = registry.login(&user("alice", Role::User));
        registry.set_role("alice", Role::Admin);
        assert_eq!(registry.get(&token).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_expired_sessions_are_rejected_and_dropped() {
        let registry = SessionRegistry::with_ttl(Duration::ZERO);
        let token = registry.login(&user("alice", Role::User));

        assert!(registry.get(&token).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_login_sweeps_expired_sessions() {
        let registry = SessionRegistry::with_ttl(Duration::ZERO);
        for _ in 0..5 {
            registry.login(&user("alice", Role::User));
        }
        // Only the session opened by the latest login remains
        assert_eq!(registry.len(), 1);
    }
}
