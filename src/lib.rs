//! # swarm-client
//!
//! Typed async client for the Perforce Swarm REST API.
//!
//! ## Overview
//!
//! Every call goes through one request pipeline:
//!
//! - **Rate limiting**: the first request probes the server's
//!   `RateLimit-Limit` header and configures a token bucket once per client
//! - **Authentication**: basic auth (token generated lazily, refreshed once
//!   on 401), job tokens, OAuth bearer tokens or private tokens
//! - **Retries**: 429 and 5xx responses are retried with jittered backoff,
//!   honoring `RateLimit-Reset`
//! - **Errors**: Swarm's loosely shaped error bodies are folded into one
//!   deterministic message
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use swarm_client::{ListProjectsOptions, SwarmClient};
//!
//! #[tokio::main]
//! async fn main() -> swarm_client::Result<()> {
//!     let client = SwarmClient::builder()
//!         .base_url("https://swarm.example.com")
//!         .basic_auth("alice", "secret")?;
//!
//!     let (projects, _resp) = client
//!         .projects()
//!         .list(&ListProjectsOptions::default(), &[])
//!         .await?;
//!     for p in projects {
//!         println!("{} ({} branches)", p.id, p.branches.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, request pipeline, auth and per-call options |
//! | [`services`] | Project and workflow endpoints |
//! | [`types`] | Request options and response bodies |
//! | [`resilience`] | Backoff, retry policy and rate limiting |
//! | [`transport`] | HTTP transport |
//! | [`error_payload`] | Swarm error body normalization |

pub mod client;
pub mod error_payload;
pub mod resilience;
pub mod services;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::request::{with_cancellation, with_context, with_header, with_headers, with_timeout};
pub use client::{
    path_escape, AuthType, CallContext, ClientConfig, Request, RequestOption, Response,
    SwarmClient, SwarmClientBuilder,
};
pub use error_payload::{ErrorPayload, ErrorResponse};
pub use services::{ProjectsService, ResourceId, WorkflowsService};
pub use types::{
    Branch, CreateProjectOptions, ListProjectsOptions, ListWorkflowsOptions, Project,
    ReviewRule, UpdateProjectOptions, Workflow,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
