//! List projects and their branches on a Swarm server.
//!
//! Credentials are read from environment variables:
//! - SWARM_URL (e.g. https://swarm.example.com)
//! - SWARM_USER / SWARM_PASSWORD
//!
//! Usage:
//!   SWARM_URL=... SWARM_USER=... SWARM_PASSWORD=... RUST_LOG=swarm_client=debug \
//!     cargo run --example list_projects

use std::time::Duration;
use swarm_client::{with_timeout, ListProjectsOptions, SwarmClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::var("SWARM_URL")?;
    let user = std::env::var("SWARM_USER")?;
    let password = std::env::var("SWARM_PASSWORD")?;

    let client = SwarmClient::builder()
        .base_url(url)
        .basic_auth(user, password)?;

    let opts = ListProjectsOptions {
        fields: Some("id,name,members,branches".into()),
        ..Default::default()
    };
    let (projects, resp) = client
        .projects()
        .list(&opts, &[with_timeout(Duration::from_secs(30))])
        .await?;

    println!("{} projects (HTTP {})", projects.len(), resp.status);
    for p in projects {
        println!("{}  {}  members={}", p.id, p.name, p.members.len());
        for b in p.branches {
            let workflow = if b.workflow.is_empty() { "-" } else { b.workflow.as_str() };
            println!("    {}  workflow={}  paths={}", b.name, workflow, b.paths.len());
        }
    }

    Ok(())
}
