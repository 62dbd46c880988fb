use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;

/// Lifecycle states for an access request.
///
/// `Completed` is reserved for a future provisioning-finished hook: it
/// serializes and deserializes, but no transition reaches it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Draft => "Draft",
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Datasets a request may draw from. Single-valued today; new entries are
/// added as provisioning pipelines come online.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dataset {
    #[default]
    #[serde(rename = "RIO")]
    Rio,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Rio => "RIO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RIO" => Some(Dataset::Rio),
            _ => None,
        }
    }
}

/// A before/after pair for one tracked field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: String,
    pub to: String,
}

/// One immutable entry in a request's audit feed.
///
/// Created either by an explicit user comment or implicitly when a mutation
/// changes tracked fields (carrying the before/after diff). There is no
/// edit or delete — corrections are new entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub updated_by: User,
    pub updated_when: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updated_fields: BTreeMap<String, FieldChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A researcher's request for access to a dataset within a TRE workspace.
///
/// Wire names follow the original camelCase contract (`projectId`,
/// `cohortSelectionQuery`, ...). `id`, `requestor` and `requested_when` are
/// server-assigned at create time and absent until then.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Dataset>,
    #[serde(default)]
    pub cohort_selection_query: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requestor: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_when: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updates: Vec<Update>,
}

impl AccessRequest {
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.requestor.as_ref().is_some_and(|r| r.id == user.id)
    }
}
