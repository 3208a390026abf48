//! Credentials and the cached auth token.

use super::context::CallContext;
use crate::{Error, ErrorContext, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

pub const HEADER_JOB_TOKEN: &str = "job-token";
pub const HEADER_PRIVATE_TOKEN: &str = "private-token";

/// Authentication scheme, fixed when the client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// `Authorization: Basic <base64(user:password)>`, generated lazily.
    BasicAuth,
    /// `JOB-TOKEN: <token>`
    JobToken,
    /// `Authorization: Bearer <token>`
    OAuthToken,
    /// `PRIVATE-TOKEN: <token>`
    PrivateToken,
}

/// Owns credentials and the token derived from them.
///
/// The token sits behind a read/write lock: requests read it concurrently,
/// generation takes the write side.
pub struct AuthManager {
    auth_type: AuthType,
    username: String,
    password: String,
    token: RwLock<String>,
    generations: AtomicU64,
}

impl AuthManager {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::BasicAuth,
            username: username.into(),
            password: password.into(),
            token: RwLock::new(String::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// A manager for one of the externally supplied token schemes.
    ///
    /// Passing [`AuthType::BasicAuth`] here seeds the basic token directly.
    pub fn with_token(auth_type: AuthType, token: impl Into<String>) -> Self {
        Self {
            auth_type,
            username: String::new(),
            password: String::new(),
            token: RwLock::new(token.into()),
            generations: AtomicU64::new(0),
        }
    }

    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    pub async fn current_token(&self) -> String {
        self.token.read().await.clone()
    }

    /// How many basic tokens have been generated so far.
    pub fn refresh_count(&self) -> u64 {
        self.generations.load(Ordering::SeqCst)
    }

    /// Return the token to use for a request, generating the basic token
    /// on first use.
    pub async fn ensure_token(&self, ctx: &CallContext) -> Result<String> {
        let observed = ctx.run(self.token.read()).await?.clone();
        if self.auth_type == AuthType::BasicAuth && observed.is_empty() {
            return self.refresh(ctx, &observed).await;
        }
        Ok(observed)
    }

    /// Regenerate the basic token.
    ///
    /// `observed` is the token the caller last saw. If another caller has
    /// replaced it while this one waited for the lock, the newer token is
    /// returned as is.
    ///
    /// The token is `user:password` in the standard base64 alphabet with
    /// padding, as HTTP Basic expects. The URL-safe alphabet is not used,
    /// so passwords that encode to `+` or `/` keep those characters.
    pub async fn refresh(&self, ctx: &CallContext, observed: &str) -> Result<String> {
        let mut token = ctx.run(self.token.write()).await?;

        if token.as_str() != observed {
            return Ok(token.clone());
        }

        if self.username.is_empty() || self.password.is_empty() {
            return Err(Error::MissingCredentials);
        }

        let raw = format!("{}:{}", self.username, self.password);
        *token = STANDARD.encode(raw.as_bytes());
        let n = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation = n, "generated basic auth token");

        Ok(token.clone())
    }

    /// Set the auth header for `token` on `headers`.
    ///
    /// Basic auth always overwrites `Authorization`; the token schemes leave
    /// a header supplied by a request option untouched.
    pub fn apply(&self, headers: &mut HeaderMap, token: &str) -> Result<()> {
        let (name, value) = match self.auth_type {
            AuthType::BasicAuth => {
                headers.insert(AUTHORIZATION, header_value(&format!("Basic {}", token))?);
                return Ok(());
            }
            AuthType::JobToken => (HeaderName::from_static(HEADER_JOB_TOKEN), token.to_string()),
            AuthType::OAuthToken => (AUTHORIZATION, format!("Bearer {}", token)),
            AuthType::PrivateToken => (
                HeaderName::from_static(HEADER_PRIVATE_TOKEN),
                token.to_string(),
            ),
        };
        if !headers.contains_key(&name) {
            headers.insert(name, header_value(&value)?);
        }
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    let mut v = HeaderValue::from_str(value).map_err(|e| {
        Error::validation_with_context(
            format!("invalid auth header value: {}", e),
            ErrorContext::new().with_source("auth_manager"),
        )
    })?;
    v.set_sensitive(true);
    Ok(v)
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
