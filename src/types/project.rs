use super::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Query parameters for listing projects.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListProjectsOptions {
    /// Comma separated list of fields to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Branch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub defaults: BranchDefaults,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BranchDefaults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewers: BranchReviewers,
}

/// Default reviewers keyed by user. Values are free form: `[]` for an
/// optional reviewer, `{"required": true}` for a required one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BranchReviewers {
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: BTreeMap<String, Value>,
}

impl BranchReviewers {
    pub fn is_required(&self, user: &str) -> bool {
        self.users
            .get(user)
            .and_then(|v| v.get("required"))
            .map(|r| matches!(r, Value::Bool(true)) || r.as_str() == Some("true"))
            .unwrap_or(false)
    }
}

/// Form fields for `POST projects`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateProjectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchOptions>,
}

/// Form fields for `PATCH projects/{id}`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProjectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchOptions>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BranchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsOptions>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DefaultsOptions {
    pub reviewers: BTreeMap<String, ReviewerOptions>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
}
