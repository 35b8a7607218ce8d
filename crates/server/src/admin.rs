//! Admin dashboard: activity metrics, user moderation and the feedback log.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use data_loader::Catalog;
use storage::{FeedbackRepository, Role, StoreError, UserRepository};

use crate::auth::{AuthError, Result};

/// Window used for the active-user count
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub total_users: usize,
    /// Distinct users with feedback newer than the activity window
    pub active_last_7_days: usize,
}

/// User table row without the password digest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
    #[serde(serialize_with = "storage::timestamp::serialize")]
    pub created_at: NaiveDateTime,
}

/// One feedback row as shown to admins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackLogEntry {
    pub user: String,
    pub item: String,
    pub product: String,
    pub action: &'static str,
    #[serde(serialize_with = "storage::timestamp::serialize")]
    pub timestamp: NaiveDateTime,
}

#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    feedback: Arc<dyn FeedbackRepository>,
    catalog: Arc<Catalog>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        feedback: Arc<dyn FeedbackRepository>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            users,
            feedback,
            catalog,
        }
    }

    /// Metrics relative to the current local time
    pub fn metrics(&self) -> Result<DashboardMetrics> {
        self.metrics_at(Local::now().naive_local())
    }

    /// Metrics relative to `now`: a user is active when at least one of
    /// their feedback rows is strictly newer than `now - 7 days`.
    pub fn metrics_at(&self, now: NaiveDateTime) -> Result<DashboardMetrics> {
        let total_users = self
            .users
            .all()?
            .into_iter()
            .map(|u| u.username)
            .collect::<HashSet<_>>()
            .len();

        let cutoff = now - Duration::days(ACTIVE_WINDOW_DAYS);
        let active_last_7_days = self
            .feedback
            .all()?
            .into_iter()
            .filter(|r| r.timestamp > cutoff)
            .map(|r| r.user)
            .collect::<HashSet<_>>()
            .len();

        Ok(DashboardMetrics {
            total_users,
            active_last_7_days,
        })
    }

    pub fn users(&self) -> Result<Vec<UserSummary>> {
        Ok(self
            .users
            .all()?
            .into_iter()
            .map(|u| UserSummary {
                username: u.username,
                role: u.role,
                created_at: u.created_at,
            })
            .collect())
    }

    /// Flip a user between the user and admin roles; returns the new role
    pub fn toggle_role(&self, username: &str) -> Result<Role> {
        let user = self
            .users
            .get(username)?
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;
        let role = user.role.toggled();
        self.users.set_role(username, role).map_err(|e| match e {
            StoreError::NotFound { username } => AuthError::UserNotFound(username),
            other => AuthError::Store(other),
        })?;
        info!("Role of {} changed to {}", username, role);
        Ok(role)
    }

    /// Every feedback row, newest first
    pub fn feedback_log(&self) -> Result<Vec<FeedbackLogEntry>> {
        let mut entries: Vec<FeedbackLogEntry> = self
            .feedback
            .all()?
            .into_iter()
            .map(|r| FeedbackLogEntry {
                product: self.catalog.title(&r.item).to_string(),
                action: r.feedback.label(),
                user: r.user,
                item: r.item,
                timestamp: r.timestamp,
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use data_loader::TitleRow;
    use storage::{FeedbackRecord, FeedbackValue, InMemoryFeedbackStore, InMemoryUserStore, UserRecord};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn feedback(user: &str, item: &str, value: FeedbackValue, ts: NaiveDateTime) -> FeedbackRecord {
        FeedbackRecord {
            user: user.to_string(),
            item: item.to_string(),
            feedback: value,
            timestamp: ts,
        }
    }

    fn setup() -> AdminService {
        let users = Arc::new(InMemoryUserStore::new());
        for (name, role) in [("admin", Role::Admin), ("alice", Role::User), ("bob", Role::User)] {
            users
                .insert(UserRecord {
                    username: name.to_string(),
                    password: "x".to_string(),
                    role,
                    created_at: at(1, 0),
                })
                .unwrap();
        }

        let store = Arc::new(InMemoryFeedbackStore::new());
        store.append(feedback("alice", "A", FeedbackValue::Like, at(20, 9))).unwrap();
        store.append(feedback("alice", "B", FeedbackValue::Dislike, at(21, 9))).unwrap();
        store.append(feedback("bob", "A", FeedbackValue::Dislike, at(10, 9))).unwrap();
        store.append(feedback("carol", "Z", FeedbackValue::Like, at(15, 12))).unwrap();

        let mut catalog = Catalog::new();
        catalog.insert_title(TitleRow {
            asin: "A".to_string(),
            title: "Mechanical Keyboard".to_string(),
        });

        AdminService::new(users, store, Arc::new(catalog))
    }

    #[test]
    fn test_metrics() {
        let admin = setup();
        let metrics = admin.metrics_at(at(22, 12)).unwrap();

        assert_eq!(metrics.total_users, 3);
        // alice is active; bob is too old; carol sits exactly on the cutoff
        assert_eq!(metrics.active_last_7_days, 1);
    }

    #[test]
    fn test_toggle_role() {
        let admin = setup();
        assert_eq!(admin.toggle_role("alice").unwrap(), Role::Admin);
        assert_eq!(admin.toggle_role("alice").unwrap(), Role::User);
        assert!(matches!(admin.toggle_role("ghost"), Err(AuthError::UserNotFound(_))));
    }

    #[test]
    fn test_feedback_log_newest_first_with_titles() {
        let admin = setup();
        let log = admin.feedback_log().unwrap();

        let items: Vec<&str> = log.iter().map(|e| e.item.as_str()).collect();
        assert_eq!(items, vec!["B", "A", "Z", "A"]);
        assert_eq!(log[0].action, "Dislike");
        assert_eq!(log[0].product, "B");
        assert_eq!(log[1].product, "Mechanical Keyboard");
        assert_eq!(log[1].action, "Like");
    }

    #[test]
    fn test_users_omit_digests() {
        let admin = setup();
        let json = serde_json::to_string(&admin.users().unwrap()).unwrap();
        assert!(json.contains("\"role\":\"admin\""));
        assert!(!json.contains("password"));
    }
}
