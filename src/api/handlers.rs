use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AccessRequest, RequestStatus, Update, User};
use crate::store::Scope;
use crate::AppState;

use super::auth::CurrentUser;

// ── Request DTOs ─────────────────────────────────────────────

/// Reviewer decision body: the target status plus an optional comment that
/// lands in the request's feed.
#[derive(Deserialize)]
pub struct DecisionBody {
    pub status: RequestStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct MessageBody {
    pub comment: String,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/me — echo the authenticated user.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// POST /api/request — create a new Draft from the submitted snapshot.
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AccessRequest>,
) -> Result<(StatusCode, Json<AccessRequest>), AppError> {
    let created = state.store.create(&payload, &user).await?;
    tracing::info!(id = ?created.id, requestor = %user.id, "request created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/request — every request, reviewer-only.
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AccessRequest>>, AppError> {
    Ok(Json(state.store.fetch_scope(Scope::All, &user).await?))
}

/// GET /api/request/my — the caller's own requests.
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AccessRequest>>, AppError> {
    Ok(Json(state.store.fetch_scope(Scope::Mine, &user).await?))
}

/// GET /api/request/pending — requests awaiting review, reviewer-only.
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AccessRequest>>, AppError> {
    Ok(Json(state.store.fetch_scope(Scope::Pending, &user).await?))
}

/// GET /api/request/:id — single request, owner or reviewer.
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessRequest>, AppError> {
    Ok(Json(state.store.fetch(id, &user).await?))
}

/// PUT /api/request/:id — draft edit by the owner. Outside Draft the edit
/// guard ignores the attempt and the stored record comes back unchanged.
pub async fn update_request(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccessRequest>,
) -> Result<Json<AccessRequest>, AppError> {
    Ok(Json(state.store.replace(id, &payload, &user).await?))
}

/// POST /api/request/:id/submit — Draft → Pending by the owner, validated
/// against the full required-field set.
pub async fn submit_request(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessRequest>, AppError> {
    let request = state
        .store
        .transition(id, RequestStatus::Pending, None, &user)
        .await?;
    tracing::info!(%id, requestor = %user.id, "request submitted for review");
    Ok(Json(request))
}

/// POST /api/request/:id/status — reviewer decision (approve / reject /
/// return). An approval additionally triggers the dataset provisioning
/// pipeline and appends the run link to the feed as a system entry.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<AccessRequest>, AppError> {
    let mut request = state
        .store
        .transition(id, body.status, body.comment, &user)
        .await?;
    tracing::info!(%id, status = %body.status, reviewer = %user.id, "reviewer decision applied");

    if body.status == RequestStatus::Approved {
        if let Some(run_link) = state.provisioner.trigger(&request).await? {
            state
                .store
                .append_update(
                    id,
                    format!("Data provisioning pipeline triggered. See the run here: {run_link}"),
                    &User::system(),
                )
                .await?;
            request = state.store.fetch(id, &user).await?;
        }
    }

    Ok(Json(request))
}

/// GET /api/request/:id/message — the request's feed, oldest first.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Update>>, AppError> {
    Ok(Json(state.store.list_updates(id, &user).await?))
}

/// POST /api/request/:id/message — append a comment, returning the entry.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MessageBody>,
) -> Result<(StatusCode, Json<Update>), AppError> {
    let update = state.store.append_update(id, body.comment, &user).await?;
    Ok((StatusCode::CREATED, Json(update)))
}
