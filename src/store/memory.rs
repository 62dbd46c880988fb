//! In-memory request store. Used by tests and local development; shares the
//! lifecycle semantics with the Postgres store through [`crate::lifecycle`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lifecycle;
use crate::models::{AccessRequest, RequestStatus, Update, User};

use super::{ensure_can_view, ensure_scope_allowed, RequestStore, Scope};

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<Uuid, AccessRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(
        &self,
        request: &AccessRequest,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let id = Uuid::new_v4();
        let created = lifecycle::create_request(id, request, user);
        self.items.write().await.insert(id, created.clone());
        Ok(created)
    }

    async fn fetch(&self, id: Uuid, user: &User) -> Result<AccessRequest, AppError> {
        let items = self.items.read().await;
        let request = items.get(&id).ok_or(AppError::NotFound)?;
        ensure_can_view(request, user)?;
        Ok(request.clone())
    }

    async fn fetch_scope(
        &self,
        scope: Scope,
        user: &User,
    ) -> Result<Vec<AccessRequest>, AppError> {
        ensure_scope_allowed(scope, user)?;
        let items = self.items.read().await;
        let mut rows: Vec<AccessRequest> = items
            .values()
            .filter(|r| match scope {
                Scope::Mine => r.is_owned_by(user),
                Scope::Pending => r.status == RequestStatus::Pending,
                Scope::All => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.requested_when.cmp(&a.requested_when));
        Ok(rows)
    }

    async fn replace(
        &self,
        id: Uuid,
        request: &AccessRequest,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let mut items = self.items.write().await;
        let existing = items.get_mut(&id).ok_or(AppError::NotFound)?;
        lifecycle::apply_draft_edits(existing, request, user)?;
        Ok(existing.clone())
    }

    async fn transition(
        &self,
        id: Uuid,
        status: RequestStatus,
        comment: Option<String>,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let mut items = self.items.write().await;
        let existing = items.get_mut(&id).ok_or(AppError::NotFound)?;
        lifecycle::apply_transition(existing, user, status, comment, None)?;
        Ok(existing.clone())
    }

    async fn list_updates(&self, id: Uuid, user: &User) -> Result<Vec<Update>, AppError> {
        let items = self.items.read().await;
        let request = items.get(&id).ok_or(AppError::NotFound)?;
        ensure_can_view(request, user)?;
        Ok(request.updates.clone())
    }

    async fn append_update(
        &self,
        id: Uuid,
        comment: String,
        user: &User,
    ) -> Result<Update, AppError> {
        if comment.trim().is_empty() {
            return Err(AppError::Validation {
                missing: vec!["comment".to_string()],
            });
        }
        let mut items = self.items.write().await;
        let request = items.get_mut(&id).ok_or(AppError::NotFound)?;
        ensure_can_view(request, user)?;
        Ok(lifecycle::record_update(
            request,
            user,
            Default::default(),
            Some(comment),
        ))
    }
}
