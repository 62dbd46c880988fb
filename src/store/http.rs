//! HTTP client store — speaks the AccessDesk wire API.
//!
//! This is the [`RequestStore`] a deployed client shell uses. Identity rides
//! on the `x-user-*` headers for the acting user; the fronting auth proxy
//! owns token validation. Non-2xx responses map back onto the error
//! taxonomy so callers see the same errors as with a local store.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AccessRequest, RequestStatus, Update, User};

use super::{RequestStore, Scope};

pub struct HttpStore {
    base: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        // validate eagerly so a bad URL fails at construction, not first use
        url::Url::parse(base_url)?;
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    fn identify(&self, builder: reqwest::RequestBuilder, user: &User) -> reqwest::RequestBuilder {
        let roles: Vec<String> = user.roles.iter().cloned().map(String::from).collect();
        builder
            .header("x-user-id", &user.id)
            .header("x-user-name", &user.name)
            .header("x-user-roles", roles.join(","))
    }

    async fn expect_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }
}

/// Map a non-2xx response onto the error taxonomy, recovering the missing
/// field list from the validation message where possible.
async fn error_from_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let message = body["error"]["message"].as_str().unwrap_or("").to_string();

    match status.as_u16() {
        401 | 403 => AppError::Forbidden(if message.is_empty() {
            "forbidden".to_string()
        } else {
            message
        }),
        404 => AppError::NotFound,
        409 => AppError::Conflict(message),
        422 => AppError::Validation {
            missing: message
                .strip_prefix("missing required fields: ")
                .map(|rest| rest.split(", ").map(str::to_string).collect())
                .unwrap_or_default(),
        },
        _ => AppError::Transport(format!("store returned {status}: {message}")),
    }
}

#[async_trait]
impl RequestStore for HttpStore {
    async fn create(
        &self,
        request: &AccessRequest,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let response = self
            .identify(self.client.post(self.url("/request")), user)
            .json(request)
            .send()
            .await?;
        self.expect_json(response).await
    }

    async fn fetch(&self, id: Uuid, user: &User) -> Result<AccessRequest, AppError> {
        let response = self
            .identify(self.client.get(self.url(&format!("/request/{id}"))), user)
            .send()
            .await?;
        self.expect_json(response).await
    }

    async fn fetch_scope(
        &self,
        scope: Scope,
        user: &User,
    ) -> Result<Vec<AccessRequest>, AppError> {
        let path = match scope {
            Scope::Mine => "/request/my",
            Scope::Pending => "/request/pending",
            Scope::All => "/request",
        };
        let response = self
            .identify(self.client.get(self.url(path)), user)
            .send()
            .await?;
        self.expect_json(response).await
    }

    async fn replace(
        &self,
        id: Uuid,
        request: &AccessRequest,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let response = self
            .identify(self.client.put(self.url(&format!("/request/{id}"))), user)
            .json(request)
            .send()
            .await?;
        self.expect_json(response).await
    }

    async fn transition(
        &self,
        id: Uuid,
        status: RequestStatus,
        comment: Option<String>,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        // Submit is the requestor's own endpoint; everything else is a
        // reviewer decision.
        let response = if status == RequestStatus::Pending {
            self.identify(
                self.client.post(self.url(&format!("/request/{id}/submit"))),
                user,
            )
            .send()
            .await?
        } else {
            self.identify(
                self.client.post(self.url(&format!("/request/{id}/status"))),
                user,
            )
            .json(&json!({ "status": status, "comment": comment }))
            .send()
            .await?
        };
        self.expect_json(response).await
    }

    async fn list_updates(&self, id: Uuid, user: &User) -> Result<Vec<Update>, AppError> {
        let response = self
            .identify(
                self.client.get(self.url(&format!("/request/{id}/message"))),
                user,
            )
            .send()
            .await?;
        self.expect_json(response).await
    }

    async fn append_update(
        &self,
        id: Uuid,
        comment: String,
        user: &User,
    ) -> Result<Update, AppError> {
        let response = self
            .identify(
                self.client.post(self.url(&format!("/request/{id}/message"))),
                user,
            )
            .json(&json!({ "comment": comment }))
            .send()
            .await?;
        self.expect_json(response).await
    }
}
