use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod auth;
pub mod handlers;

/// Build the request API router.
/// All routes are relative — the caller mounts this under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(handlers::me))
        .route(
            "/request",
            get(handlers::list_all).post(handlers::create_request),
        )
        .route("/request/my", get(handlers::list_mine))
        .route("/request/pending", get(handlers::list_pending))
        .route(
            "/request/:id",
            get(handlers::get_request).put(handlers::update_request),
        )
        .route("/request/:id/submit", post(handlers::submit_request))
        .route("/request/:id/status", post(handlers::update_status))
        .route(
            "/request/:id/message",
            get(handlers::list_messages).post(handlers::post_message),
        )
}
