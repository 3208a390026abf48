//! # Types Module
//!
//! Request options and response bodies for the Swarm resources.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Project`] | A project with its members and branches |
//! | [`Workflow`] | A review workflow and its rules |
//! | [`CreateProjectOptions`] | Form fields for creating a project |
//! | [`ReviewRule`] | A rule value plus its inheritance mode |
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`project`] | Project and branch types |
//! | [`workflow`] | Workflow types |

pub mod project;
pub mod workflow;

pub use project::{
    Branch, BranchDefaults, BranchOptions, BranchReviewers, CreateProjectOptions,
    DefaultsOptions, ListProjectsOptions, Project, ReviewerOptions, UpdateProjectOptions,
};
pub use workflow::{EndRule, ListWorkflowsOptions, OnSubmit, ReviewRule, Workflow};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default. Swarm returns `null` for
/// unset lists and strings.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
