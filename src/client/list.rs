//! Scoped request list projection.
//!
//! A read-only view over one [`Scope`]. It refreshes only when the shell's
//! [`RefreshSignal`](super::shell::RefreshSignal) has been bumped since the
//! last sync; between bumps the view may lag the store, and nothing polls.

use std::sync::Arc;

use crate::errors::AppError;
use crate::models::AccessRequest;
use crate::store::{RequestStore, Scope};

use super::shell::RefreshSignal;
use super::Session;

pub struct RequestList {
    store: Arc<dyn RequestStore>,
    session: Session,
    scope: Scope,
    items: Vec<AccessRequest>,
    seen: u64,
    loaded: bool,
}

impl RequestList {
    pub fn new(store: Arc<dyn RequestStore>, session: Session, scope: Scope) -> Self {
        Self {
            store,
            session,
            scope,
            items: Vec::new(),
            seen: 0,
            loaded: false,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Newest first, as fetched.
    pub fn items(&self) -> &[AccessRequest] {
        &self.items
    }

    /// Re-fetch if `signal` has advanced past the last sync (or on first
    /// call). Returns whether a fetch actually happened.
    pub async fn sync(&mut self, signal: &RefreshSignal) -> Result<bool, AppError> {
        let current = signal.current();
        if self.loaded && current == self.seen {
            return Ok(false);
        }
        self.items = self
            .store
            .fetch_scope(self.scope, self.session.user())
            .await?;
        self.seen = current;
        self.loaded = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dataset, Role, User};
    use crate::store::memory::MemoryStore;

    fn researcher() -> User {
        User {
            id: "res-1".into(),
            name: "Rina".into(),
            roles: vec![Role::Researcher],
        }
    }

    fn snapshot() -> AccessRequest {
        AccessRequest {
            project_id: "P01".into(),
            project_name: "Sepsis".into(),
            title: "Cohort".into(),
            description: "Adults".into(),
            workspace_id: "ws-1".into(),
            dataset: Some(Dataset::Rio),
            cohort_selection_query: "age > 18".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sync_fetches_once_per_signal_bump() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(researcher());
        let signal = RefreshSignal::new();
        let mut list = RequestList::new(store.clone(), session.clone(), Scope::Mine);

        assert!(list.sync(&signal).await.unwrap());
        assert!(list.items().is_empty());
        assert!(!list.sync(&signal).await.unwrap(), "no bump, no fetch");

        store.create(&snapshot(), session.user()).await.unwrap();
        assert!(
            list.items().is_empty(),
            "no refetch until the signal advances"
        );

        signal.bump();
        assert!(list.sync(&signal).await.unwrap());
        assert_eq!(list.items().len(), 1);
    }

    #[tokio::test]
    async fn pending_scope_surfaces_authorization_errors() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(researcher());
        let signal = RefreshSignal::new();
        let mut list = RequestList::new(store, session, Scope::Pending);

        let err = list.sync(&signal).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
