//! Resource services bound to a [`SwarmClient`](crate::SwarmClient).

mod projects;
mod workflows;

pub use projects::ProjectsService;
pub use workflows::WorkflowsService;

use crate::client::path_escape;
use std::fmt;

/// A project or workflow identifier, numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Number(u64),
    Name(String),
}

impl ResourceId {
    /// The identifier escaped for use as a path segment.
    pub fn escaped(&self) -> String {
        path_escape(&self.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{}", n),
            ResourceId::Name(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ResourceId {
    fn from(n: u64) -> Self {
        ResourceId::Number(n)
    }
}

impl From<u32> for ResourceId {
    fn from(n: u32) -> Self {
        ResourceId::Number(n.into())
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        ResourceId::Name(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        ResourceId::Name(s)
    }
}

impl From<&String> for ResourceId {
    fn from(s: &String) -> Self {
        ResourceId::Name(s.clone())
    }
}
