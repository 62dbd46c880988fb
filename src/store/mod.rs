//! Request store abstraction.
//!
//! Every operation takes the acting [`User`] so that implementations apply
//! the same visibility and capability rules whether the records live in
//! memory, in Postgres, or behind the remote HTTP API. Reads are idempotent;
//! writes are never auto-retried here — retry policy belongs to whichever
//! transport sits in front.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AccessRequest, RequestStatus, Update, User};

pub mod http;
pub mod memory;
pub mod postgres;

/// Server-side filter for list reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Requests owned by the caller.
    Mine,
    /// Requests awaiting review. Reviewer-only.
    Pending,
    /// Every request. Reviewer-only.
    All,
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist a new Draft owned by `user`, returning the stored record
    /// (id, requestor, and timestamp assigned; initial diff in the feed).
    async fn create(&self, request: &AccessRequest, user: &User)
        -> Result<AccessRequest, AppError>;

    /// Fetch one request. Owner or reviewer only.
    async fn fetch(&self, id: Uuid, user: &User) -> Result<AccessRequest, AppError>;

    /// Fetch a scoped list, newest first.
    async fn fetch_scope(&self, scope: Scope, user: &User)
        -> Result<Vec<AccessRequest>, AppError>;

    /// Draft edit by the owner. Outside Draft the stored record is returned
    /// unchanged (the edit guard ignores the attempt).
    async fn replace(
        &self,
        id: Uuid,
        request: &AccessRequest,
        user: &User,
    ) -> Result<AccessRequest, AppError>;

    /// Execute a lifecycle transition, appending exactly one feed entry.
    async fn transition(
        &self,
        id: Uuid,
        status: RequestStatus,
        comment: Option<String>,
        user: &User,
    ) -> Result<AccessRequest, AppError>;

    /// The request's feed in chronological (oldest-first) order.
    async fn list_updates(&self, id: Uuid, user: &User) -> Result<Vec<Update>, AppError>;

    /// Append a free-text comment, returning the new entry.
    async fn append_update(
        &self,
        id: Uuid,
        comment: String,
        user: &User,
    ) -> Result<Update, AppError>;
}

/// Owner, reviewer, or the internal system principal.
pub(crate) fn ensure_can_view(request: &AccessRequest, user: &User) -> Result<(), AppError> {
    if user.is_reviewer() || user.is_system() || request.is_owned_by(user) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "user is neither a DataManager nor the original requestor".to_string(),
        ))
    }
}

pub(crate) fn ensure_scope_allowed(scope: Scope, user: &User) -> Result<(), AppError> {
    match scope {
        Scope::Mine => Ok(()),
        Scope::Pending | Scope::All if user.is_reviewer() => Ok(()),
        Scope::Pending | Scope::All => Err(AppError::Forbidden(
            "listing other users' requests requires the DataManager role".to_string(),
        )),
    }
}
