//! Request form controller.
//!
//! Wraps one [`AccessRequest`] being viewed or edited. Field edits go
//! through the draft guard (silent no-op once the request has left Draft),
//! submit eligibility is recomputed on every edit, and at most one mutation
//! is in flight at a time: a second call while busy gets [`AppError::Busy`]
//! without touching the network. A failed mutation clears the busy flag so
//! the user can retry manually — nothing here retries on its own.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AppError;
use crate::lifecycle::{self, EditOutcome};
use crate::models::{AccessRequest, Dataset, RequestStatus};
use crate::store::RequestStore;

use super::Session;

pub struct RequestForm {
    store: Arc<dyn RequestStore>,
    session: Session,
    request: AccessRequest,
    sending: bool,
}

impl RequestForm {
    /// A blank Draft. The dataset defaults to the single live option so a
    /// fresh form starts with it preselected.
    pub fn new(store: Arc<dyn RequestStore>, session: Session) -> Self {
        Self {
            store,
            session,
            request: AccessRequest {
                dataset: Some(Dataset::default()),
                ..Default::default()
            },
            sending: false,
        }
    }

    /// Load an existing request into the form.
    pub async fn load(
        store: Arc<dyn RequestStore>,
        session: Session,
        id: Uuid,
    ) -> Result<Self, AppError> {
        let request = store.fetch(id, session.user()).await?;
        Ok(Self {
            store,
            session,
            request,
            sending: false,
        })
    }

    pub fn request(&self) -> &AccessRequest {
        &self.request
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Edit one tracked field by wire name. Outside Draft this is an
    /// ignored no-op, mirroring the read-only form once submitted.
    pub fn set_field(&mut self, name: &str, value: &str) -> EditOutcome {
        if self.request.status != RequestStatus::Draft {
            return EditOutcome::Ignored;
        }
        let changed = lifecycle::set_tracked_field(&mut self.request, name, value)
            .unwrap_or(false);
        EditOutcome::Applied { changed }
    }

    pub fn missing_fields(&self) -> Vec<String> {
        lifecycle::missing_required_fields(&self.request)
    }

    pub fn is_submit_eligible(&self) -> bool {
        lifecycle::is_submit_eligible(&self.request)
    }

    /// Persist the draft: create on first save, replace afterwards. The
    /// stored record (with server-assigned id and feed) replaces the local
    /// snapshot.
    pub async fn save(&mut self) -> Result<(), AppError> {
        if self.sending {
            return Err(AppError::Busy);
        }
        self.sending = true;
        let result = match self.request.id {
            None => {
                self.store
                    .create(&self.request, self.session.user())
                    .await
            }
            Some(id) => {
                self.store
                    .replace(id, &self.request, self.session.user())
                    .await
            }
        };
        self.sending = false;
        self.request = result?;
        Ok(())
    }

    /// Submit for review. Validation runs locally first — an incomplete
    /// form never reaches the store — and the store re-validates
    /// authoritatively.
    pub async fn submit(&mut self) -> Result<(), AppError> {
        if self.sending {
            return Err(AppError::Busy);
        }
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation { missing });
        }
        let id = self.request.id.ok_or(AppError::NotFound)?;
        self.sending = true;
        let result = self
            .store
            .transition(id, RequestStatus::Pending, None, self.session.user())
            .await;
        self.sending = false;
        self.request = result?;
        Ok(())
    }

    /// Reviewer decision: approve, reject, or return to draft, with an
    /// optional comment for the feed.
    pub async fn decide(
        &mut self,
        status: RequestStatus,
        comment: Option<String>,
    ) -> Result<(), AppError> {
        if self.sending {
            return Err(AppError::Busy);
        }
        let id = self.request.id.ok_or(AppError::NotFound)?;
        self.sending = true;
        let result = self
            .store
            .transition(id, status, comment, self.session.user())
            .await;
        self.sending = false;
        self.request = result?;
        Ok(())
    }
}
