//! Identity extraction.
//!
//! Authentication is an external collaborator: the fronting auth proxy
//! validates tokens and injects the resolved identity as `x-user-id`,
//! `x-user-name`, and `x-user-roles` (comma-separated) headers. This
//! extractor trusts those headers and only enforces that the caller holds
//! at least one application role.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::models::{Role, User};

pub struct CurrentUser(pub User);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, "x-user-id")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Forbidden("missing identity headers".to_string()))?
            .to_string();
        let name = header(parts, "x-user-name").unwrap_or(&id).to_string();
        let roles: Vec<Role> = header(parts, "x-user-roles")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Role::from(s.to_string()))
            .collect();

        let user = User { id, name, roles };
        if !user.has_app_role() {
            return Err(AppError::Forbidden(
                "user must be assigned a Researcher or DataManager role".to_string(),
            ));
        }
        Ok(CurrentUser(user))
    }
}
