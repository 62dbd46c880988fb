//! Request lifecycle: transition rules, submit validation, the draft edit
//! guard, and field-level change tracking.
//!
//! Everything here is pure — stores call into this module so that the
//! in-memory, Postgres, and remote implementations share one set of
//! semantics. The state machine:
//!
//! ```text
//! (create) → Draft ─submit→ Pending ─approve→ Approved
//!              ▲                    ─reject→  Rejected
//!              └───────return───────┘
//! ```
//!
//! Approved and Rejected are terminal. A Draft reached via return is
//! re-editable and re-submittable.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AccessRequest, FieldChange, RequestStatus, Update, User};

/// Fields a requestor fills in, in wire-name form. These are the fields the
/// diff engine tracks and the submit validation requires.
pub const TRACKED_FIELDS: [&str; 7] = [
    "projectId",
    "projectName",
    "title",
    "description",
    "workspaceId",
    "dataset",
    "cohortSelectionQuery",
];

/// Outcome of a draft edit attempt. Mutations outside Draft are ignored, not
/// errors — the record stays read-only once submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The request was in Draft; `changed` is false when the submitted
    /// snapshot was identical to the stored one.
    Applied { changed: bool },
    /// The request has left Draft; nothing was touched.
    Ignored,
}

/// Required fields still empty on `request`, in `TRACKED_FIELDS` order.
pub fn missing_required_fields(request: &AccessRequest) -> Vec<String> {
    let mut missing = Vec::new();
    let mut check = |name: &str, empty: bool| {
        if empty {
            missing.push(name.to_string());
        }
    };
    check("projectId", request.project_id.trim().is_empty());
    check("projectName", request.project_name.trim().is_empty());
    check("title", request.title.trim().is_empty());
    check("description", request.description.trim().is_empty());
    check("workspaceId", request.workspace_id.trim().is_empty());
    check("dataset", request.dataset.is_none());
    check(
        "cohortSelectionQuery",
        request.cohort_selection_query.trim().is_empty(),
    );
    missing
}

pub fn is_submit_eligible(request: &AccessRequest) -> bool {
    missing_required_fields(request).is_empty()
}

/// Copy tracked fields from `incoming` onto `existing`, returning the diff.
/// Only fields whose values actually differ appear in the result, each as a
/// `{from, to}` pair keyed by wire name.
pub fn apply_tracked_edits(
    existing: &mut AccessRequest,
    incoming: &AccessRequest,
) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    let mut diff = |name: &str, from: &str, to: &str| {
        let changed = from != to;
        if changed {
            changes.insert(
                name.to_string(),
                FieldChange {
                    from: from.to_string(),
                    to: to.to_string(),
                },
            );
        }
        changed
    };

    if diff("projectId", &existing.project_id, &incoming.project_id) {
        existing.project_id = incoming.project_id.clone();
    }
    if diff("projectName", &existing.project_name, &incoming.project_name) {
        existing.project_name = incoming.project_name.clone();
    }
    if diff("title", &existing.title, &incoming.title) {
        existing.title = incoming.title.clone();
    }
    if diff("description", &existing.description, &incoming.description) {
        existing.description = incoming.description.clone();
    }
    if diff("workspaceId", &existing.workspace_id, &incoming.workspace_id) {
        existing.workspace_id = incoming.workspace_id.clone();
    }
    let from_dataset = existing.dataset.map(|d| d.as_str()).unwrap_or_default();
    let to_dataset = incoming.dataset.map(|d| d.as_str()).unwrap_or_default();
    if diff("dataset", from_dataset, to_dataset) {
        existing.dataset = incoming.dataset;
    }
    if diff(
        "cohortSelectionQuery",
        &existing.cohort_selection_query,
        &incoming.cohort_selection_query,
    ) {
        existing.cohort_selection_query = incoming.cohort_selection_query.clone();
    }

    changes
}

/// Set one tracked field by wire name. Returns `None` for an unknown name,
/// otherwise whether the value changed. Does not bypass the edit guard —
/// callers check status first.
pub fn set_tracked_field(
    request: &mut AccessRequest,
    name: &str,
    value: &str,
) -> Option<bool> {
    fn assign(slot: &mut String, value: &str) -> bool {
        if slot == value {
            false
        } else {
            *slot = value.to_string();
            true
        }
    }
    match name {
        "projectId" => Some(assign(&mut request.project_id, value)),
        "projectName" => Some(assign(&mut request.project_name, value)),
        "title" => Some(assign(&mut request.title, value)),
        "description" => Some(assign(&mut request.description, value)),
        "workspaceId" => Some(assign(&mut request.workspace_id, value)),
        "dataset" => {
            let parsed = crate::models::Dataset::parse(value);
            let changed = request.dataset != parsed;
            request.dataset = parsed;
            Some(changed)
        }
        "cohortSelectionQuery" => Some(assign(&mut request.cohort_selection_query, value)),
        _ => None,
    }
}

/// Is `from → to` an edge of the lifecycle at all, regardless of actor?
pub fn is_legal_transition(from: RequestStatus, to: RequestStatus) -> bool {
    matches!(
        (from, to),
        (RequestStatus::Draft, RequestStatus::Pending)
            | (RequestStatus::Pending, RequestStatus::Approved)
            | (RequestStatus::Pending, RequestStatus::Rejected)
            | (RequestStatus::Pending, RequestStatus::Draft)
    )
}

/// Build a fresh Draft record owned by `actor`. Tracked fields start blank;
/// the caller applies the submitted snapshot on top and records the initial
/// diff so the feed captures every field filled at creation.
pub fn new_draft(id: Uuid, actor: &User) -> AccessRequest {
    AccessRequest {
        id: Some(id),
        status: RequestStatus::Draft,
        requestor: Some(actor.clone()),
        requested_when: Some(Utc::now()),
        ..Default::default()
    }
}

/// Create a request from a submitted snapshot: blank Draft plus the initial
/// field diff as the first feed entry.
pub fn create_request(id: Uuid, incoming: &AccessRequest, actor: &User) -> AccessRequest {
    let mut request = new_draft(id, actor);
    let changes = apply_tracked_edits(&mut request, incoming);
    if !changes.is_empty() {
        record_update(&mut request, actor, changes, None);
    }
    request
}

/// Apply a draft edit. Only the owning requestor may call this; outside
/// Draft the attempt is a silent no-op (`EditOutcome::Ignored`). An actual
/// change appends one diff entry to the feed.
pub fn apply_draft_edits(
    existing: &mut AccessRequest,
    incoming: &AccessRequest,
    actor: &User,
) -> Result<EditOutcome, AppError> {
    if !existing.is_owned_by(actor) {
        return Err(AppError::Forbidden(
            "only the original requestor may edit this request".to_string(),
        ));
    }
    if existing.status != RequestStatus::Draft {
        return Ok(EditOutcome::Ignored);
    }
    let changes = apply_tracked_edits(existing, incoming);
    if changes.is_empty() {
        return Ok(EditOutcome::Applied { changed: false });
    }
    record_update(existing, actor, changes, None);
    Ok(EditOutcome::Applied { changed: true })
}

/// Execute a status transition against the stored record.
///
/// Checks, in order: the edge exists, the actor holds the capability for it
/// (owner for submit, DataManager for reviewer decisions), and — for submit
/// — that every required field is present. On success the status changes in
/// place and exactly one feed entry is appended, carrying the status
/// `{from, to}` pair, the diff of any simultaneously edited fields, and the
/// optional comment.
pub fn apply_transition(
    request: &mut AccessRequest,
    actor: &User,
    to: RequestStatus,
    comment: Option<String>,
    edits: Option<&AccessRequest>,
) -> Result<Update, AppError> {
    let from = request.status;
    if !is_legal_transition(from, to) {
        return Err(AppError::InvalidTransition { from, to });
    }

    match (from, to) {
        (RequestStatus::Draft, RequestStatus::Pending) => {
            if !request.is_owned_by(actor) {
                return Err(AppError::Forbidden(
                    "only the original requestor may submit this request".to_string(),
                ));
            }
        }
        _ => {
            if !actor.is_reviewer() {
                return Err(AppError::Forbidden(
                    "reviewer decisions require the DataManager role".to_string(),
                ));
            }
        }
    }

    let mut fields = match edits {
        Some(incoming) => apply_tracked_edits(request, incoming),
        None => BTreeMap::new(),
    };

    // Submit is validated after any carried edits, against the final snapshot.
    if from == RequestStatus::Draft && to == RequestStatus::Pending {
        let missing = missing_required_fields(request);
        if !missing.is_empty() {
            return Err(AppError::Validation { missing });
        }
    }

    fields.insert(
        "status".to_string(),
        FieldChange {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        },
    );
    request.status = to;

    let comment = comment.filter(|c| !c.trim().is_empty());
    Ok(record_update(request, actor, fields, comment))
}

/// Append an immutable feed entry and return a copy of it.
pub fn record_update(
    request: &mut AccessRequest,
    actor: &User,
    fields: BTreeMap<String, FieldChange>,
    comment: Option<String>,
) -> Update {
    let update = Update {
        updated_by: actor.clone(),
        updated_when: Utc::now(),
        updated_fields: fields,
        comment,
    };
    request.updates.push(update.clone());
    update
}
