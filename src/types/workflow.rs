use super::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description sent when a workflow is updated without one; the v10
/// endpoint rejects an empty description.
pub const DEFAULT_UPDATE_DESCRIPTION: &str = "Updated by v10 api.";

/// Prefix Swarm expects on group identifiers in exclusion rules.
pub const GROUP_PREFIX: &str = "swarm-group-";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListWorkflowsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(rename = "noCache", skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
}

/// A review workflow.
///
/// Serializes to the form fields of the v10 update endpoint; `id` is
/// part of the URL and never sent in the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing)]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shared: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owners: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub on_submit: OnSubmit,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_rules: EndRule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auto_approve: ReviewRule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub counted_votes: ReviewRule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_exclusions: ReviewRule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_exclusions: ReviewRule,
}

/// A rule value and its mode (`inherit`, `enforce`, ...).
///
/// `rule` is a string for most rules and a list of identifiers for the
/// exclusion rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRule {
    #[serde(default)]
    pub rule: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: String,
}

impl ReviewRule {
    pub fn new(rule: impl Into<Value>, mode: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            mode: mode.into(),
        }
    }

    /// The rule as a single string, when it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.rule.as_str()
    }

    /// The rule as a list of strings; non-string items are skipped.
    pub fn as_list(&self) -> Vec<String> {
        self.rule
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnSubmit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub with_review: ReviewRule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub without_review: ReviewRule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndRule {
    #[serde(default, deserialize_with = "null_as_default")]
    pub update: ReviewRule,
}

/// Prefix `group` with [`GROUP_PREFIX`] unless it already carries it.
pub fn swarm_group(group: &str) -> String {
    if group.starts_with(GROUP_PREFIX) {
        group.to_string()
    } else {
        format!("{}{}", GROUP_PREFIX, group)
    }
}
