use super::request::Request;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

/// Metadata of a Swarm API response.
///
/// The body is consumed by the pipeline; what remains is enough to inspect
/// status and rate-limit headers after a call (or after an API error, see
/// [`crate::Error::response`]).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// URL the request was sent to.
    pub url: Url,
    /// URL that produced this response, after any redirects.
    pub final_url: Url,
    pub method: Method,
}

impl Response {
    pub(crate) fn from_reqwest(req: &Request, resp: &reqwest::Response) -> Self {
        Self {
            status: resp.status(),
            headers: resp.headers().clone(),
            url: req.url().clone(),
            final_url: resp.url().clone(),
            method: req.method().clone(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
