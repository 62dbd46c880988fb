//! Update feed view for one request.
//!
//! The store keeps the feed chronological; this view presents it newest
//! first for display. Entries are immutable — a posted comment can only be
//! followed by more entries, never edited or removed.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Update;
use crate::store::RequestStore;

use super::Session;

pub struct UpdateFeed {
    store: Arc<dyn RequestStore>,
    session: Session,
    request_id: Uuid,
    entries: Vec<Update>,
}

impl UpdateFeed {
    pub fn new(store: Arc<dyn RequestStore>, session: Session, request_id: Uuid) -> Self {
        Self {
            store,
            session,
            request_id,
            entries: Vec::new(),
        }
    }

    /// Entries newest first.
    pub fn entries(&self) -> &[Update] {
        &self.entries
    }

    pub async fn refresh(&mut self) -> Result<(), AppError> {
        let mut updates = self
            .store
            .list_updates(self.request_id, self.session.user())
            .await?;
        updates.reverse();
        self.entries = updates;
        Ok(())
    }

    /// Post a comment and surface it at the top of the view. Empty input is
    /// rejected locally, matching the disabled send button in the UI.
    pub async fn post_comment(&mut self, comment: &str) -> Result<(), AppError> {
        if comment.trim().is_empty() {
            return Err(AppError::Validation {
                missing: vec!["comment".to_string()],
            });
        }
        let update = self
            .store
            .append_update(self.request_id, comment.to_string(), self.session.user())
            .await?;
        self.entries.insert(0, update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessRequest, Dataset, Role, User};
    use crate::store::memory::MemoryStore;

    fn researcher() -> User {
        User {
            id: "res-1".into(),
            name: "Rina".into(),
            roles: vec![Role::Researcher],
        }
    }

    #[tokio::test]
    async fn comments_read_newest_first_and_stay_put() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(researcher());
        let created = store
            .create(
                &AccessRequest {
                    title: "Cohort".into(),
                    dataset: Some(Dataset::Rio),
                    ..Default::default()
                },
                session.user(),
            )
            .await
            .unwrap();

        let mut feed = UpdateFeed::new(store, session, created.id.unwrap());
        for text in ["first", "second", "third"] {
            feed.post_comment(text).await.unwrap();
        }

        let comments: Vec<_> = feed
            .entries()
            .iter()
            .filter_map(|u| u.comment.clone())
            .collect();
        assert_eq!(comments, vec!["third", "second", "first"]);

        // a refresh from the store preserves the same order
        feed.refresh().await.unwrap();
        let refreshed: Vec<_> = feed
            .entries()
            .iter()
            .filter_map(|u| u.comment.clone())
            .collect();
        assert_eq!(refreshed, comments);
    }

    #[tokio::test]
    async fn empty_comments_never_leave_the_client() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(researcher());
        let mut feed = UpdateFeed::new(store, session, Uuid::new_v4());
        let err = feed.post_comment("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
