//! Integration tests with mock HTTP servers

pub mod pipeline;
pub mod projects;
