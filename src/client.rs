//! Swarm API client.
//!
//! Keep the public surface small: build a [`SwarmClient`] with
//! [`SwarmClientBuilder`], then use the resource services or the raw
//! request pipeline. Implementation details are split into submodules
//! under `src/client/`.

pub mod auth;
pub mod builder;
pub mod config;
pub mod context;
pub mod core;
mod execution;
pub mod request;
mod response;

pub use auth::AuthType;
pub use builder::SwarmClientBuilder;
pub use config::ClientConfig;
pub use context::CallContext;
pub use self::core::{RequestHook, ResponseHook, SwarmClient, API_VERSION_PATH, DEFAULT_BASE_URL};
pub use request::{path_escape, Request, RequestOption, API_V10_PATH};
pub use response::Response;
