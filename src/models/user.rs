use serde::{Deserialize, Serialize};

/// Application roles, as resolved by the identity provider.
///
/// `Researcher` carries the requestor capability (create, edit, submit own
/// requests); `DataManager` carries the reviewer capability (see every
/// request, approve/reject/return pending ones). Role strings we do not
/// recognise are preserved but grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Researcher,
    DataManager,
    Other(String),
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Researcher" => Role::Researcher,
            "DataManager" => Role::DataManager,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Researcher => "Researcher".to_string(),
            Role::DataManager => "DataManager".to_string(),
            Role::Other(s) => s,
        }
    }
}

/// An authenticated principal. Identity management lives upstream — within
/// this service a `User` is a read-only reference, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    /// The internal principal used for service-generated feed entries
    /// (e.g. the provisioning-pipeline notice on approval).
    pub fn system() -> Self {
        User {
            id: "system".to_string(),
            name: "System".to_string(),
            roles: Vec::new(),
        }
    }

    pub fn is_reviewer(&self) -> bool {
        self.roles.contains(&Role::DataManager)
    }

    pub fn is_system(&self) -> bool {
        self.id == "system"
    }

    /// Whether the user holds any role that grants access to the app at all.
    pub fn has_app_role(&self) -> bool {
        self.roles
            .iter()
            .any(|r| matches!(r, Role::Researcher | Role::DataManager))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_known_names() {
        assert_eq!(Role::from("Researcher".to_string()), Role::Researcher);
        assert_eq!(Role::from("DataManager".to_string()), Role::DataManager);
        assert_eq!(String::from(Role::DataManager), "DataManager");
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let user = User {
            id: "u1".into(),
            name: "Someone".into(),
            roles: vec![Role::from("Auditor".to_string())],
        };
        assert!(!user.is_reviewer());
        assert!(!user.has_app_role());
    }

    #[test]
    fn reviewer_requires_data_manager_role() {
        let user = User {
            id: "u1".into(),
            name: "Someone".into(),
            roles: vec![Role::Researcher],
        };
        assert!(user.has_app_role());
        assert!(!user.is_reviewer());
    }
}
