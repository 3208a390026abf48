//! Request execution: limiter, auth, retries and response checking.

use super::auth::AuthType;
use super::context::CallContext;
use super::core::SwarmClient;
use super::request::Request;
use super::Response;
use crate::error_payload::ErrorResponse;
use crate::resilience::rate_limiter::{RateLimit, RateLimiter, RateLimiterConfig};
use crate::transport::TransportError;
use crate::{Error, Result};
use futures::StreamExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Statuses treated as success; everything else becomes [`Error::Api`].
pub(crate) fn is_success(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201 | 202 | 204 | 304)
}

impl SwarmClient {
    /// Send `req` and decode the JSON body into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, req: Request) -> Result<(T, Response)> {
        let (resp, meta) = self.send(&req).await?;
        let body = req
            .context()
            .run(resp.bytes())
            .await?
            .map_err(TransportError::Http)?;
        let value = serde_json::from_slice(&body)?;
        Ok((value, meta))
    }

    /// Send `req` and copy the raw body into `writer` without decoding it.
    pub async fn execute_raw<W>(&self, req: Request, writer: &mut W) -> Result<Response>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let (resp, meta) = self.send(&req).await?;
        let ctx = req.context();
        let mut stream = Box::pin(resp.bytes_stream());
        while let Some(chunk) = ctx.run(stream.next()).await? {
            let chunk = chunk.map_err(TransportError::Http)?;
            ctx.run(writer.write_all(&chunk)).await??;
        }
        ctx.run(writer.flush()).await??;
        Ok(meta)
    }

    /// Send `req` and discard the body.
    pub async fn execute_empty(&self, req: Request) -> Result<Response> {
        let (_resp, meta) = self.send(&req).await?;
        Ok(meta)
    }

    /// Run the full pipeline up to a successful response.
    ///
    /// A 401 under basic auth forces one token refresh and one more pass;
    /// a second 401 is returned as an API error.
    async fn send(&self, req: &Request) -> Result<(reqwest::Response, Response)> {
        let ctx = req.context();
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let limiter = self.limiter(ctx).await;
        let mut refreshed = false;

        loop {
            limiter.wait(ctx).await?;

            let token = self.auth.ensure_token(ctx).await?;
            let mut authed = req.clone();
            self.auth.apply(&mut authed.headers, &token)?;

            let (resp, meta) = self.send_with_retries(&authed, &request_id).await?;

            if meta.status == StatusCode::UNAUTHORIZED
                && self.auth.auth_type() == AuthType::BasicAuth
                && !refreshed
            {
                drop(resp);
                debug!(request_id = %request_id, "401 with basic auth, refreshing token");
                self.auth.refresh(ctx, &token).await?;
                refreshed = true;
                continue;
            }

            if !is_success(meta.status) {
                let body = ctx.run(resp.bytes()).await?.map_err(TransportError::Http)?;
                info!(
                    request_id = %request_id,
                    http_status = meta.status.as_u16(),
                    method = %meta.method,
                    url = %meta.url,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "swarm request failed"
                );
                return Err(ErrorResponse::new(meta, body).into());
            }

            debug!(
                request_id = %request_id,
                http_status = meta.status.as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "swarm request succeeded"
            );
            return Ok((resp, meta));
        }
    }

    /// Transport attempts for one authenticated request, driven by the
    /// retry policy. Exhausted retries hand back the last response.
    async fn send_with_retries(
        &self,
        req: &Request,
        request_id: &str,
    ) -> Result<(reqwest::Response, Response)> {
        let ctx = req.context();
        let mut attempt: u32 = 0;

        loop {
            if let Some(hook) = &self.on_request {
                hook(req, attempt);
            }
            debug!(
                request_id,
                attempt,
                method = %req.method(),
                url = %req.url(),
                "sending swarm request"
            );

            let outcome = ctx.run(self.transport.send(req.to_reqwest())).await?;
            let can_retry = attempt < self.retry.max_retries;

            match outcome {
                Err(err) => {
                    if !(can_retry && self.retry.should_retry(ctx, None)) {
                        return Err(err);
                    }
                    let delay = self.retry.delay(attempt, None);
                    debug!(
                        request_id,
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after transport error"
                    );
                    ctx.sleep(delay).await?;
                }
                Ok(resp) => {
                    let meta = Response::from_reqwest(req, &resp);
                    if let Some(hook) = &self.on_response {
                        hook(&meta);
                    }
                    if !(can_retry && self.retry.should_retry(ctx, Some(&meta))) {
                        return Ok((resp, meta));
                    }
                    drop(resp);
                    let delay = self.retry.delay(attempt, Some(&meta));
                    debug!(
                        request_id,
                        attempt,
                        http_status = meta.status.as_u16(),
                        delay_ms = delay.as_millis() as u64,
                        "retrying swarm request"
                    );
                    ctx.sleep(delay).await?;
                }
            }
            attempt += 1;
        }
    }

    /// The client's limiter, configured on first use.
    async fn limiter(&self, ctx: &CallContext) -> &Arc<dyn RateLimit> {
        self.limiter
            .get_or_init(|| self.probe_rate_limit(ctx))
            .await
    }

    /// Ask the server for its rate limit with one unauthenticated GET to
    /// the base URL. Any failure leaves the client unlimited.
    async fn probe_rate_limit(&self, ctx: &CallContext) -> Arc<dyn RateLimit> {
        let probe = async {
            let req = self
                .transport
                .client()
                .get(self.base_url.clone())
                .build()
                .map_err(TransportError::Http)?;
            let resp = ctx.run(self.transport.send(req)).await??;
            Ok::<_, Error>(RateLimiterConfig::from_headers(resp.headers()))
        };

        let cfg = match probe.await {
            Ok(cfg) => {
                debug!(
                    rps = cfg.rps,
                    burst = cfg.burst,
                    unlimited = cfg.is_unlimited(),
                    "configured rate limiter"
                );
                cfg
            }
            Err(err) => {
                warn!(
                    error = %err,
                    url = %self.base_url,
                    "rate limit probe failed, requests will not be limited"
                );
                RateLimiterConfig::unlimited()
            }
        };
        Arc::new(RateLimiter::new(cfg))
    }
}
