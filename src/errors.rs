use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::RequestStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("request not found")]
    NotFound,

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("another mutation is already in flight")]
    Busy,

    #[error("store error: {0}")]
    Transport(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Validation { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "missing_required_fields",
                self.to_string(),
            ),
            AppError::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "forbidden",
                reason.clone(),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "request_not_found",
                "request not found".to_string(),
            ),
            AppError::InvalidTransition { .. } => (
                StatusCode::CONFLICT,
                "conflict_error",
                "invalid_transition",
                self.to_string(),
            ),
            AppError::Conflict(reason) => (
                StatusCode::CONFLICT,
                "conflict_error",
                "conflict",
                reason.clone(),
            ),
            AppError::Busy => (
                StatusCode::CONFLICT,
                "conflict_error",
                "client_busy",
                "another mutation is already in flight".to_string(),
            ),
            AppError::Transport(e) => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "store_unreachable",
                e.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_missing_fields() {
        let err = AppError::Validation {
            missing: vec!["title".into(), "dataset".into()],
        };
        assert_eq!(err.to_string(), "missing required fields: title, dataset");
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = AppError::InvalidTransition {
            from: RequestStatus::Approved,
            to: RequestStatus::Pending,
        };
        assert_eq!(err.to_string(), "invalid transition: Approved -> Pending");
    }
}
