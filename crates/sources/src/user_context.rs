//! Helper functions to build UserContext from the feedback log

use crate::types::UserContext;
use anyhow::{Context, Result};
use storage::{FeedbackRecord, FeedbackRepository, FeedbackValue};

/// Build a UserContext from the rows of one user's feedback.
///
/// Rows belonging to other users are ignored. Every dislike counts; rows
/// are not collapsed by recency.
pub fn build_user_context(user_id: &str, feedback: &[FeedbackRecord]) -> UserContext {
    let mut context = UserContext::new(user_id);

    for record in feedback.iter().filter(|r| r.user == user_id) {
        context.feedback_count += 1;
        match record.feedback {
            FeedbackValue::Dislike => {
                context.disliked_items.insert(record.item.clone());
            }
            FeedbackValue::Like => {
                context.liked_items.insert(record.item.clone());
            }
        }
    }

    context
}

/// Read a user's feedback from the repository and build the context
pub fn load_user_context(user_id: &str, feedback: &dyn FeedbackRepository) -> Result<UserContext> {
    let rows = feedback
        .for_user(user_id)
        .with_context(|| format!("Failed to read feedback for user {}", user_id))?;
    Ok(build_user_context(user_id, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::InMemoryFeedbackStore;

    fn rows() -> Vec<FeedbackRecord> {
        vec![
            FeedbackRecord::now("u1", "A", FeedbackValue::Dislike),
            FeedbackRecord::now("u1", "B", FeedbackValue::Like),
            FeedbackRecord::now("u2", "C", FeedbackValue::Dislike),
            FeedbackRecord::now("u1", "A", FeedbackValue::Like),
        ]
    }

    #[test]
    fn test_build_user_context_basic() {
        let context = build_user_context("u1", &rows());

        assert_eq!(context.user_id, "u1");
        assert_eq!(context.feedback_count, 3);
        assert!(context.liked_items.contains("B"));
        assert!(!context.disliked_items.contains("C"));
    }

    #[test]
    fn test_later_like_keeps_dislike() {
        let context = build_user_context("u1", &rows());

        assert!(context.disliked_items.contains("A"));
        assert!(context.liked_items.contains("A"));
    }

    #[test]
    fn test_user_with_no_feedback() {
        let context = build_user_context("stranger", &rows());
        assert_eq!(context.feedback_count, 0);
        assert!(context.disliked_items.is_empty());
    }

    #[test]
    fn test_load_from_repository() {
        let store = InMemoryFeedbackStore::new();
        for row in rows() {
            store.append(row).unwrap();
        }

        let context = load_user_context("u2", &store).unwrap();
        assert_eq!(context.disliked_items.len(), 1);
        assert!(context.disliked_items.contains("C"));
    }
}
