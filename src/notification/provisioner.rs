//! Dataset provisioning trigger.
//!
//! When a request is approved, the provisioning pipeline (an external data
//! factory) is kicked off with the request's dataset, workspace, and cohort
//! query. The pipeline endpoint returns a link to the run, which the caller
//! appends to the request's feed. Unconfigured (no `DATA_PROVISIONING_URL`)
//! means the step is skipped entirely — useful for dev environments without
//! a pipeline.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::AccessRequest;

/// Parameters posted to the pipeline endpoint. The cohort query is
/// base64-encoded so quoting survives the transport untouched.
#[derive(Debug, Serialize)]
pub struct PipelineParameters {
    pub dataset_name: String,
    pub workspace_id: String,
    pub query_base64: String,
}

#[derive(Debug, Deserialize)]
struct PipelineRunResponse {
    run_link: String,
}

pub struct PipelineTrigger {
    client: reqwest::Client,
    url: Option<String>,
}

impl PipelineTrigger {
    pub fn new(url: Option<String>) -> anyhow::Result<Self> {
        if let Some(u) = &url {
            url::Url::parse(u)?;
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, url })
    }

    /// Fire the pipeline for an approved request. Returns the run link, or
    /// `None` when no endpoint is configured.
    pub async fn trigger(&self, request: &AccessRequest) -> Result<Option<String>, AppError> {
        let Some(url) = &self.url else {
            return Ok(None);
        };

        let params = PipelineParameters {
            dataset_name: request
                .dataset
                .map(|d| d.as_str().to_string())
                .unwrap_or_default(),
            workspace_id: request.workspace_id.clone(),
            query_base64: BASE64.encode(request.cohort_selection_query.as_bytes()),
        };

        let response = self
            .client
            .post(url.as_str())
            .json(&params)
            .send()
            .await
            .map_err(|e| {
                warn!("provisioning pipeline unreachable: {}", e);
                AppError::Transport(format!("failed to trigger provisioning pipeline: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "provisioning pipeline rejected the trigger");
            return Err(AppError::Transport(format!(
                "provisioning pipeline returned {status}"
            )));
        }

        let run: PipelineRunResponse = response.json().await?;
        info!(run_link = %run.run_link, "provisioning pipeline triggered");
        Ok(Some(run.run_link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;

    #[tokio::test]
    async fn unconfigured_trigger_is_a_no_op() {
        let trigger = PipelineTrigger::new(None).unwrap();
        let request = AccessRequest {
            dataset: Some(Dataset::Rio),
            ..Default::default()
        };
        assert_eq!(trigger.trigger(&request).await.unwrap(), None);
    }

    #[test]
    fn invalid_url_fails_at_construction() {
        assert!(PipelineTrigger::new(Some("not a url".into())).is_err());
    }

    #[test]
    fn cohort_query_is_base64_encoded() {
        let params = PipelineParameters {
            dataset_name: "RIO".into(),
            workspace_id: "ws-1".into(),
            query_base64: BASE64.encode("age > 18"),
        };
        assert_eq!(params.query_base64, "YWdlID4gMTg=");
    }
}
